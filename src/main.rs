use anyhow::{anyhow, bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use npcbot_bridge::config::{BridgeConfig, ScriptHost};
use npcbot_bridge::dispatch::BotDispatcher;
use npcbot_bridge::roster::BotRoster;
use npcbot_bridge::scripting::{self, RhaiBotHost};
use npcbot_bridge::Operation;

const EMBEDDED_ROSTER: &str = include_str!(concat!(env!("OUT_DIR"), "/npcbot_embedded_roster.json"));

const USAGE: &str = "usage: npcbot-bridge [--rhai|--lua] [--roster <path>] [--list] <script>";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    host: Option<ScriptHost>,
    roster: Option<String>,
    list: bool,
    script: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--lua" => cli.host = Some(ScriptHost::Lua),
            "--rhai" => cli.host = Some(ScriptHost::Rhai),
            "--list" => cli.list = true,
            "--roster" => {
                let path = args.next().context("--roster needs a path")?;
                cli.roster = Some(path);
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ if cli.script.is_some() => bail!("only one script may be given\n{USAGE}"),
            _ => cli.script = Some(arg),
        }
    }
    Ok(cli)
}

fn print_operations() {
    for operation in Operation::ALL {
        let gate = if operation.requires_owner() {
            "  [owned bots only]"
        } else {
            ""
        };
        println!("{}{gate}", operation.signature());
    }
}

fn load_roster(path: Option<&str>) -> Result<BotRoster> {
    match path {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).with_context(|| format!("reading roster {path}"))?;
            let roster = BotRoster::from_json(&contents)
                .with_context(|| format!("loading roster {path}"))?;
            info!("loaded roster from {path}");
            Ok(roster)
        }
        None => {
            let roster = BotRoster::from_json(EMBEDDED_ROSTER).context("loading embedded roster")?;
            info!("loaded embedded demo roster");
            Ok(roster)
        }
    }
}

fn run_script(host: ScriptHost, roster: BotRoster, dispatcher: BotDispatcher, name: &str, source: &str) -> Result<()> {
    let world = scripting::share(roster);
    match host {
        ScriptHost::Rhai => RhaiBotHost::new(world, dispatcher)
            .run(name, source)
            .map_err(|e| anyhow!("{name}: {e}")),
        #[cfg(not(target_arch = "wasm32"))]
        ScriptHost::Lua => scripting::LuaBotHost::new(world, dispatcher)
            .and_then(|host| host.run(name, source))
            .map_err(|e| anyhow!("{name}: {e}")),
        #[cfg(target_arch = "wasm32")]
        ScriptHost::Lua => bail!("the Lua host is not available on this target"),
    }
}

fn main() -> Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;
    let mut config = BridgeConfig::load();
    if let Some(host) = cli.host {
        config.script_host = host;
    }
    if cli.roster.is_some() {
        config.roster_path = cli.roster.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if cli.list {
        print_operations();
        if cli.script.is_none() {
            return Ok(());
        }
    }

    let Some(script) = cli.script else {
        bail!("no script given\n{USAGE}");
    };
    let source =
        std::fs::read_to_string(&script).with_context(|| format!("reading script {script}"))?;
    let roster = load_roster(config.roster_path.as_deref())?;
    info!(host = ?config.script_host, "running {script}");
    run_script(
        config.script_host,
        roster,
        BotDispatcher::from_config(&config),
        &script,
        &source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_host_roster_and_script() {
        let cli = parse_args(args(&["--rhai", "--roster", "r.json", "demo.rhai"])).expect("parse");
        assert_eq!(
            cli,
            CliArgs {
                host: Some(ScriptHost::Rhai),
                roster: Some("r.json".to_string()),
                list: false,
                script: Some("demo.rhai".to_string()),
            }
        );
    }

    #[test]
    fn rejects_unknown_flags_and_extra_scripts() {
        assert!(parse_args(args(&["--python", "a.lua"])).is_err());
        assert!(parse_args(args(&["a.lua", "b.lua"])).is_err());
        assert!(parse_args(args(&["--roster"])).is_err());
    }

    #[test]
    fn embedded_roster_parses() {
        assert!(BotRoster::from_json(EMBEDDED_ROSTER).is_ok());
    }
}
