//! End-to-end tests against the in-process controller simulator.

use std::time::Duration;

use nalgebra::Vector3;
use tokio_util::sync::CancellationToken;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use armscript::channel::{ChannelConfig, CommandChannel};
use armscript::controller::RobotController;
use armscript::converge::{self, pose_within, ToleranceProfile, WaitOptions};
use armscript::history::MoveHistory;
use armscript::instruction::{Instruction, MoveStep};
use armscript::pose::{JointState, Pose6D, Rpy};
use armscript::sim::{SimConfig, SimController};
use armscript::tasks::{RobotArm, HOME_JOINTS, REFERENCE_POSE};
use armscript::{Correction, RobotError};

/// Fast polling so tests don't sit in the default 100 ms sleep.
fn fast_wait() -> WaitOptions {
    WaitOptions {
        poll_interval: Some(Duration::from_millis(5)),
        ..WaitOptions::default()
    }
}

/// Simulator tuned fast enough that any test motion converges in tens of
/// milliseconds.
fn fast_sim_config(start_joints: JointState, start_pose: Pose6D) -> SimConfig {
    SimConfig {
        tick: Duration::from_millis(2),
        linear_rate: 1.0,
        joint_rate: 50.0,
        start_joints,
        start_pose,
    }
}

async fn start_sim(start_joints: JointState, start_pose: Pose6D) -> (SimController, RobotArm) {
    let sim = SimController::bind("127.0.0.1:0", fast_sim_config(start_joints, start_pose))
        .await
        .expect("bind simulator");
    let addr = sim.local_addr();
    let channel = CommandChannel::new(ChannelConfig::new(&addr.ip().to_string(), addr.port()));
    let arm = RobotArm::new(channel).with_wait_options(fast_wait());
    (sim, arm)
}

#[tokio::test]
async fn test_go_home_converges_on_home_joints() {
    let (sim, arm) = start_sim(JointState([0.0; 6]), Pose6D::from_array([0.0; 6])).await;

    arm.go_home().await.expect("go_home");

    let (joints, _) = sim.snapshot();
    assert!(joints.within(&HOME_JOINTS, 0.01));
}

#[tokio::test]
async fn test_step_forward_then_back_restores_x() {
    let start = Pose6D::from_array([0.1, 0.2, 0.3, 0.0, 0.0, 0.5]);
    let (sim, arm) = start_sim(JointState([0.0; 6]), start).await;

    arm.step_forward(0.01).await.expect("step forward");
    let (_, after_forward) = sim.snapshot();
    // Forward is -x.
    assert!((after_forward.position.x - 0.09).abs() < 0.002);

    arm.step_back(0.01).await.expect("step back");
    let (_, after_back) = sim.snapshot();
    assert!((after_back.position.x - 0.1).abs() < 0.002);
}

#[tokio::test]
async fn test_relative_move_translates_without_rotating() {
    let (sim, arm) = start_sim(JointState([0.0; 6]), Pose6D::from_array([0.0; 6])).await;

    let target = arm
        .relative_move(
            Vector3::new(0.01, 0.0, 0.0),
            Rpy::new(0.0, 0.0, 0.0),
            0.5,
            0.2,
        )
        .await
        .expect("relative move");

    assert_eq!(target.position, Vector3::new(0.01, 0.0, 0.0));
    assert_eq!(target.rotation, Vector3::zeros());

    let (_, pose) = sim.snapshot();
    assert!(pose_within(&pose, &target, &ToleranceProfile::default()));
}

#[tokio::test]
async fn test_random_init_lands_within_offset_box() {
    let (sim, arm) = start_sim(JointState([0.0; 6]), Pose6D::from_array(REFERENCE_POSE)).await;

    arm.go_random_init().await.expect("random init");

    let (_, pose) = sim.snapshot();
    let dx = pose.position.x - REFERENCE_POSE[0];
    let dy = pose.position.y - REFERENCE_POSE[1];
    let dz = pose.position.z - REFERENCE_POSE[2];
    assert!((-0.0061..=0.0061).contains(&dx), "dx = {dx}");
    assert!((-0.0061..=0.0011).contains(&dy), "dy = {dy}");
    assert!((-0.0011..=0.0061).contains(&dz), "dz = {dz}");
}

#[tokio::test]
async fn test_wrist_rotation_offsets_last_joint_only() {
    let start = JointState([0.1, -1.5, 1.5, -1.5, -1.5, 0.2]);
    let (sim, arm) = start_sim(start, Pose6D::from_array([0.0; 6])).await;

    arm.step_clockwise(10.0).await.expect("rotate");

    let (joints, _) = sim.snapshot();
    assert!((joints.0[5] - (0.2 + 10.0_f64.to_radians())).abs() < 0.01);
    for i in 0..5 {
        assert!((joints.0[i] - start.0[i]).abs() < 0.01);
    }
}

#[tokio::test]
async fn test_cancellation_aborts_stalled_wait() {
    let (sim, _) = start_sim(JointState([0.0; 6]), Pose6D::from_array([0.0; 6])).await;
    sim.freeze();

    let cancel = CancellationToken::new();
    let addr = sim.local_addr();
    let channel = CommandChannel::new(ChannelConfig::new(&addr.ip().to_string(), addr.port()));
    let arm = RobotArm::new(channel).with_wait_options(WaitOptions {
        poll_interval: Some(Duration::from_millis(10)),
        timeout: None,
        cancel: cancel.clone(),
    });

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let err = arm
        .move_joints(JointState([1.0; 6]), 1.4, 1.05, 0.02)
        .await
        .unwrap_err();
    assert!(matches!(err, RobotError::Cancelled));
}

#[tokio::test]
async fn test_timeout_surfaces_convergence_error() {
    let (sim, _) = start_sim(JointState([0.0; 6]), Pose6D::from_array([0.0; 6])).await;
    sim.freeze();

    let addr = sim.local_addr();
    let channel = CommandChannel::new(ChannelConfig::new(&addr.ip().to_string(), addr.port()));
    let arm = RobotArm::new(channel).with_wait_options(WaitOptions {
        poll_interval: Some(Duration::from_millis(10)),
        timeout: Some(Duration::from_millis(100)),
        cancel: CancellationToken::new(),
    });

    let err = arm
        .move_joints(JointState([1.0; 6]), 1.4, 1.05, 0.02)
        .await
        .unwrap_err();
    assert!(matches!(err, RobotError::ConvergenceTimeout(_)));
}

/// A controller that accepts connections but never writes a state frame.
async fn start_silent_listener() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

#[tokio::test]
async fn test_cancellation_aborts_wait_stalled_mid_read() {
    let addr = start_silent_listener().await;
    let channel = CommandChannel::new(ChannelConfig::new("127.0.0.1", addr.port()));

    let cancel = CancellationToken::new();
    let opts = WaitOptions {
        poll_interval: Some(Duration::from_millis(10)),
        timeout: None,
        cancel: cancel.clone(),
    };
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    // The connection is accepted but no frame ever arrives; cancellation
    // must interrupt the in-flight read, not just the inter-poll pause.
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        converge::wait_for_joints(&channel, &JointState([1.0; 6]), 0.01, &opts),
    )
    .await
    .expect("wait hung despite fired cancellation");
    assert!(matches!(result.unwrap_err(), RobotError::Cancelled));
}

#[tokio::test]
async fn test_timeout_aborts_wait_stalled_mid_read() {
    let addr = start_silent_listener().await;
    let channel = CommandChannel::new(ChannelConfig::new("127.0.0.1", addr.port()));

    let opts = WaitOptions {
        poll_interval: Some(Duration::from_millis(10)),
        timeout: Some(Duration::from_millis(150)),
        cancel: CancellationToken::new(),
    };

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        converge::wait_for_joints(&channel, &JointState([1.0; 6]), 0.01, &opts),
    )
    .await
    .expect("wait hung despite armed timeout");
    assert!(matches!(
        result.unwrap_err(),
        RobotError::ConvergenceTimeout(_)
    ));
}

#[tokio::test]
async fn test_sim_applies_program_despite_connection_reset() {
    let (sim, _arm) = start_sim(JointState([0.0; 6]), Pose6D::from_array([0.0; 6])).await;

    let stream = TcpStream::connect(sim.local_addr()).await.expect("connect");
    // Linger 0 turns the close below into a reset, erroring the simulator's
    // read after the program bytes were delivered.
    stream
        .set_linger(Some(Duration::ZERO))
        .expect("set linger");
    let mut stream = stream;
    stream
        .write_all(b"def motion():\n  movel(p[0.01,0,0,0,0,0], a=0.2, v=0.5, t=0, r=0)\nend\n")
        .await
        .expect("write program");
    drop(stream);

    // The target must still be applied and the simulated pose converge there.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        let (_, pose) = sim.snapshot();
        if (pose.position.x - 0.01).abs() < 1e-9 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "program discarded on reset: x = {}",
            pose.position.x
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_unknown_instruction_issues_no_motion() {
    let start = Pose6D::from_array([0.1, 0.2, 0.3, 0.0, 0.0, 0.0]);
    let (sim, arm) = start_sim(JointState([0.0; 6]), start).await;
    let controller = RobotController::new(arm);

    let executed = controller
        .execute_text("I am not sure")
        .await
        .expect("execute");
    assert_eq!(executed, Instruction::Unknown);

    let (_, pose) = sim.snapshot();
    assert_eq!(pose, start);
}

#[tokio::test]
async fn test_down_step_refused_below_safety_floor() {
    // z already at the floor: the down step must be skipped.
    let start = Pose6D::from_array([0.1, 0.2, 0.12, 0.0, 0.0, 0.0]);
    let (sim, arm) = start_sim(JointState([0.0; 6]), start).await;
    let controller = RobotController::new(arm);

    let executed = controller.execute_text("move down").await.expect("execute");
    assert_eq!(executed, Instruction::Step(MoveStep::Down));

    let (_, pose) = sim.snapshot();
    assert_eq!(pose.position.z, 0.12);
}

#[tokio::test]
async fn test_correction_replays_majority_inversion() {
    let start = Pose6D::from_array([0.1, 0.2, 0.3, 0.0, 0.0, 0.0]);
    let (sim, arm) = start_sim(JointState([0.0; 6]), start).await;
    let controller = RobotController::new(arm);

    let mut history: MoveHistory = [MoveStep::Forward, MoveStep::Forward, MoveStep::Backward]
        .into_iter()
        .collect();

    let corrections = controller
        .apply_correction(
            "No, not closer along x, closer along y, closer along rz",
            &mut history,
        )
        .await
        .expect("correction");

    assert_eq!(
        corrections,
        vec![Correction {
            direction: MoveStep::Backward,
            steps: 2,
        }]
    );
    assert_eq!(history.count(MoveStep::Backward), 3);

    // Two backward steps of the default 1 mm, backward being +x.
    let (_, pose) = sim.snapshot();
    assert!((pose.position.x - 0.102).abs() < 0.002, "x = {}", pose.position.x);
}
