/// Example: Print every segment's cumulative transform without a terminal
///
/// Usage: cargo run --example print_poses -- [arm1 arm2 palm finger]

use anyhow::{bail, Context};
use arm3d_core::{ArmModel, ArticulatedModelState, Camera, Transform};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let state = match args.len() {
        0 => ArticulatedModelState::default(),
        4 => {
            let angles = args
                .iter()
                .map(|arg| arg.parse::<f32>().with_context(|| format!("bad angle: {arg}")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            ArticulatedModelState::new(angles[0], angles[1], angles[2], angles[3])
        }
        _ => bail!("expected no arguments or four angles: arm1 arm2 palm finger"),
    };

    let model = ArmModel::default();
    let view_projection = Camera::default().view_projection();

    println!("angles: {:?}", state);
    for pose in model.poses(&state)? {
        let origin = pose.model.transform_point(&nalgebra::Point3::origin());
        let in_view = Camera::project_to_screen(
            &Transform::mvp_matrix(&view_projection, &pose.model),
            &nalgebra::Point3::origin(),
            800,
            600,
        );
        println!(
            "{:>8}: origin ({:7.2}, {:7.2}, {:7.2})  screen {:?}  invertible {}",
            pose.segment.name(),
            origin.x,
            origin.y,
            origin.z,
            in_view.map(|(x, y, _)| (x.round(), y.round())),
            Transform::normal_matrix(&pose.model).is_some(),
        );
        println!("{}", pose.model);
    }

    Ok(())
}
