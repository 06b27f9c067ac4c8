//! Fake arm controller - simulates the motion-script protocol over TCP.
//!
//! Drop-in replacement for a real controller that doesn't need hardware.
//! Accepts connections, pushes framed state reports, and drifts its
//! reported state toward whatever movej/movel targets it receives.
//!
//! Usage:
//!   fake-controller [options]
//!
//! Options:
//!   --listen <addr>      Listen address (default: 127.0.0.1:30003)
//!   --linear-rate <m/s>  Simulated tool speed (default: 0.05)
//!   --joint-rate <r/s>   Simulated joint speed (default: 1.0)

use anyhow::Result;
use armscript::pose::{JointState, Pose6D};
use armscript::sim::{SimConfig, SimController};
use armscript::tasks::REFERENCE_POSE;

struct Args {
    listen: String,
    linear_rate: f64,
    joint_rate: f64,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        listen: "127.0.0.1:30003".to_string(),
        linear_rate: 0.05,
        joint_rate: 1.0,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" if i + 1 < args.len() => {
                result.listen = args[i + 1].clone();
                i += 2;
            }
            "--linear-rate" if i + 1 < args.len() => {
                result.linear_rate = args[i + 1].parse().ok()?;
                i += 2;
            }
            "--joint-rate" if i + 1 < args.len() => {
                result.joint_rate = args[i + 1].parse().ok()?;
                i += 2;
            }
            "--help" | "-h" => return None,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                return None;
            }
        }
    }

    Some(result)
}

fn print_usage() {
    println!("Fake arm controller - simulates the motion-script protocol over TCP");
    println!();
    println!("Usage: fake-controller [options]");
    println!();
    println!("Options:");
    println!("  --listen <addr>      Listen address (default: 127.0.0.1:30003)");
    println!("  --linear-rate <m/s>  Simulated tool speed (default: 0.05)");
    println!("  --joint-rate <r/s>   Simulated joint speed (default: 1.0)");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("armscript=info".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let Some(args) = parse_args() else {
        print_usage();
        return Ok(());
    };

    let config = SimConfig {
        linear_rate: args.linear_rate,
        joint_rate: args.joint_rate,
        start_joints: JointState([0.0, -1.5708, 1.5708, -1.5708, -1.5708, 0.0]),
        start_pose: Pose6D::from_array(REFERENCE_POSE),
        ..SimConfig::default()
    };
    let sim = SimController::bind(&args.listen, config).await?;

    println!();
    println!("========================================");
    println!("Fake Arm Controller");
    println!("========================================");
    println!("Listening:   {}", sim.local_addr());
    println!("Linear rate: {} m/s", args.linear_rate);
    println!("Joint rate:  {} rad/s", args.joint_rate);
    println!("========================================");
    println!();

    tokio::signal::ctrl_c().await?;
    sim.shutdown();
    Ok(())
}
