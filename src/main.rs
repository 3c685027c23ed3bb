//! Moodloop CLI
//!
//! Usage:
//!   moodloop --sample '{"valence": -0.3, "arousal": 0.6}'   # Single mapping
//!   moodloop --interactive                                 # Sample/feedback loop on stdin
//!   moodloop --serve                                       # HTTP API server
//!   moodloop --sample '...' --json                         # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use moodloop::core::{
    load_profile, render_prompt, run_server, save_profile, DecisionEngine, ProfileLearner,
};
use moodloop::types::{Behavior, EmotionSample, ParameterSet, RewardSignal, UserProfile};
use moodloop::{Config, Error, Result, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "moodloop",
    version = VERSION,
    about = "Moodloop - Map emotion signals to adaptive ambient music parameters",
    long_about = "Moodloop turns a stream of emotion samples (valence, arousal, facial\n\
                  action units) into music-generation parameters and a text prompt,\n\
                  and learns per-user preferences from feedback.\n\n\
                  Modes:\n  \
                  --sample       Map one JSON sample\n  \
                  --interactive  JSON samples and feedback commands on stdin\n  \
                  --serve        HTTP API server mode\n\n\
                  Interactive commands:\n  \
                  {json}                        Map an emotion sample\n  \
                  like | skip                   Positive / negative behavior feedback\n  \
                  feedback <dv> <da> <b>        Full feedback (b in -1, 0, 1)\n  \
                  profile                       Print the learned profile\n  \
                  reset                         Start the session over (profile kept)\n  \
                  quit                          Exit (saves --profile)"
)]
struct Args {
    /// Emotion sample as JSON (single mode)
    #[arg(long)]
    sample: Option<String>,

    /// Interactive mode - read samples and feedback from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// User id for seeding and profile
    #[arg(short, long, default_value = "user")]
    user: String,

    /// JSON config file (engine and learner tunables)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Profile JSON file, loaded at start and saved on exit
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show prompt and decision details; debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.serve {
        run_serve(&args).await
    } else if let Some(ref sample) = args.sample {
        run_single(sample, &args)
    } else {
        run_interactive(&args)
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_tracing(verbose: bool) {
    let default = if verbose { "moodloop=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    match args.config {
        Some(ref path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn load_user_profile(args: &Args) -> Result<UserProfile> {
    match args.profile {
        Some(ref path) if path.exists() => {
            let profile = load_profile(path)?;
            tracing::info!(path = %path.display(), avoid = profile.avoid.len(), "loaded profile");
            Ok(profile)
        }
        _ => Ok(UserProfile::new()),
    }
}

fn parse_sample(json: &str) -> Result<EmotionSample> {
    serde_json::from_str(json)
        .map_err(|e| Error::invalid_input(format!("bad emotion sample: {}", e)))
}

/// Run single sample mapping
fn run_single(sample: &str, args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let profile = load_user_profile(args)?;
    let engine = DecisionEngine::with_config(config.engine);
    let mut state = engine.new_state(args.user.as_str());

    let sample = parse_sample(sample)?;
    let params = engine.map(&sample, &mut state, Some(&profile));
    let prompt = render_prompt(&params, Some(&profile));
    print_result(&params, &prompt, args)
}

/// Run interactive sample/feedback loop
fn run_interactive(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let mut profile = load_user_profile(args)?;
    let engine = DecisionEngine::with_config(config.engine);
    let mut learner = ProfileLearner::with_config(config.learner);
    let mut state = engine.new_state(args.user.as_str());

    print_header(&args.user, state.window());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[cycle {} | ε={:.3}] > ", state.cycle_index(), learner.epsilon());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended. Cycles: {}", state.cycle_index());
            break;
        }
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("profile") {
            println!("{}", serde_json::to_string_pretty(&profile)?);
            continue;
        }

        if line.eq_ignore_ascii_case("reset") {
            state.reset();
            tracing::debug!(user = %args.user, "session state reset");
            println!("{}", "  ⟲ session reset".cyan());
            continue;
        }

        if line.starts_with('{') {
            match parse_sample(line) {
                Ok(sample) => {
                    let params = engine.map(&sample, &mut state, Some(&profile));
                    let prompt = render_prompt(&params, Some(&profile));
                    print_result(&params, &prompt, args)?;
                    if learner.should_explore() {
                        println!("{}", "  ↺ exploring: try a variation".cyan());
                    }
                }
                Err(e) => println!("{}", format!("  ⚠ {}", e).yellow()),
            }
            continue;
        }

        let Some(params) = state.last_params().cloned() else {
            println!("{}", "  ⚠ No loop yet - send a JSON sample first".yellow());
            continue;
        };

        match parse_feedback(line, &params) {
            Ok(signal) => {
                let reward = learner.apply_feedback(&mut profile, &params, &signal);
                print_feedback(reward, learner.epsilon(), &profile, args.json)?;
            }
            Err(e) => println!("{}", format!("  ⚠ {}", e).yellow()),
        }
    }

    if let Some(ref path) = args.profile {
        save_profile(&profile, path)?;
        tracing::info!(path = %path.display(), "saved profile");
    }
    Ok(())
}

/// Parse `like`, `skip` or `feedback <dv> <da> <behavior>`
fn parse_feedback(line: &str, params: &ParameterSet) -> Result<RewardSignal> {
    let mut parts = line.split_whitespace();
    match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("like") => Ok(RewardSignal::behavior_only(Behavior::Positive, params.intent)),
        Some("skip") => Ok(RewardSignal::behavior_only(Behavior::Negative, params.intent)),
        Some("feedback") => {
            let fields: Vec<&str> = parts.collect();
            if fields.len() != 3 {
                return Err(Error::invalid_input(
                    "usage: feedback <delta_valence> <delta_arousal> <behavior>",
                ));
            }
            let dv: f64 = fields[0]
                .parse()
                .map_err(|_| Error::invalid_input(format!("bad delta_valence: {}", fields[0])))?;
            let da: f64 = fields[1]
                .parse()
                .map_err(|_| Error::invalid_input(format!("bad delta_arousal: {}", fields[1])))?;
            let behavior: i8 = fields[2]
                .parse()
                .map_err(|_| Error::invalid_input(format!("bad behavior: {}", fields[2])))?;
            Ok(RewardSignal::new(dv, da, Behavior::from(behavior), params.intent))
        }
        _ => Err(Error::invalid_input(format!("unknown command: {}", line))),
    }
}

/// Print header
fn print_header(user: &str, window: usize) {
    println!("{}", format!("Moodloop v{} - Interactive", VERSION).bold());
    println!("User: {} | smoothing window: {}", user, window);
    println!("Send JSON samples, then 'like', 'skip' or 'feedback <dv> <da> <b>'.");
    println!("'reset' starts the session over. Type 'quit' to exit.");
    println!();
}

fn print_result(params: &ParameterSet, prompt: &str, args: &Args) -> Result<()> {
    if args.json {
        #[derive(serde::Serialize)]
        struct MappingOutput<'a> {
            params: &'a ParameterSet,
            prompt: &'a str,
        }
        println!("{}", serde_json::to_string(&MappingOutput { params, prompt })?);
        return Ok(());
    }

    if args.no_color {
        println!("{}", params.to_parseable_string());
    } else {
        println!("{}", params.to_terminal_string());
    }

    if args.verbose {
        println!("  reason:      {}", params.meta.reason);
        println!("  confidence:  {:.2}", params.meta.confidence_used);
        if let Some(stress) = params.meta.stress_index {
            println!("  stress:      {:.3}", stress);
        }
        println!("  instruments: {}", params.instruments.join(", "));
        if !params.avoid_instruments.is_empty() {
            let avoid: Vec<&str> = params.avoid_instruments.iter().map(String::as_str).collect();
            println!("  avoid:       {}", avoid.join(", "));
        }
        println!("  prompt:      {}", prompt);
    }
    Ok(())
}

fn print_feedback(reward: f64, epsilon: f64, profile: &UserProfile, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "reward": reward,
            "epsilon": epsilon,
            "avoid": profile.avoid,
        });
        println!("{}", out);
        return Ok(());
    }

    let line = format!("  reward={:+.3} | ε={:.3}", reward, epsilon);
    if reward >= 0.0 {
        println!("{}", line.green());
    } else {
        println!("{}", line.red());
    }
    if !profile.avoid.is_empty() {
        let avoid: Vec<&str> = profile.avoid.iter().map(String::as_str).collect();
        println!("{}", format!("  avoiding: {}", avoid.join(", ")).bright_black());
    }
    Ok(())
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    run_server(&args.addr, config).await
}

// =============================================================================
// TESTS
// =============================================================================
