mod engine;
mod model;
mod settings;

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{bail, Context, Result};

use crate::engine::engine::Engine;
use crate::engine::llm_client::ChatCompletionClient;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::game_state::GameState;
use crate::model::report::FinalReport;

fn main() -> Result<()> {
    env_logger::init();

    let settings = settings::load_settings();
    let client =
        ChatCompletionClient::new(&settings).context("could not build the oracle client")?;

    if std::env::args().any(|arg| arg == "--check") {
        println!("{}", client.test_connection()?);
        return Ok(());
    }

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    thread::spawn(move || {
        Engine::new(cmd_rx, resp_tx, Box::new(client)).run();
    });

    let result = repl(&cmd_tx, &resp_rx);
    let _ = cmd_tx.send(EngineCommand::Shutdown);
    result
}

fn repl(cmd_tx: &Sender<EngineCommand>, resp_rx: &Receiver<EngineResponse>) -> Result<()> {
    let _ = cmd_tx.send(EngineCommand::ListWorlds);
    match await_response(resp_rx)? {
        EngineResponse::WorldList { builtin, custom, .. } => {
            println!("Worlds:");
            for scenario in &builtin {
                println!("  {:<12} {}", scenario.key, scenario.title);
            }
            for name in &custom {
                println!("  {:<12} (custom)", name);
            }
        }
        _ => bail!("unexpected engine response while listing worlds"),
    }

    let scenario = ask("Scenario key", "supermarket")?;
    let protagonist = ask("Protagonist", "Ye Fan")?;
    let companion = ask("Companion", "Eve")?;

    let _ = cmd_tx.send(EngineCommand::StartSession {
        scenario,
        protagonist,
        companion,
    });
    let mut turn = match await_response(resp_rx)? {
        EngineResponse::SessionStarted { scenario, snapshot } => {
            println!("\n== {} ==\n{}\n", scenario.title, scenario.description);
            print_status(&snapshot);
            snapshot.turn
        }
        EngineResponse::UnknownScenario { key } => bail!("no such world: {key}"),
        _ => bail!("unexpected engine response while starting the session"),
    };

    println!("(enter an instruction, or just press enter to let the story escalate;");
    println!(" /world <name> :: <description> defines a world, /reset restarts, /quit leaves)\n");

    loop {
        print!("turn {turn}> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line == "/quit" {
            break;
        }

        if line == "/reset" {
            let _ = cmd_tx.send(EngineCommand::Reset);
            if let EngineResponse::SessionReset { snapshot } = await_response(resp_rx)? {
                println!("The world resets.");
                print_status(&snapshot);
                turn = snapshot.turn;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("/world ") {
            match rest.split_once("::") {
                Some((name, description)) => {
                    let _ = cmd_tx.send(EngineCommand::DefineWorld {
                        name: name.trim().to_string(),
                        description: description.trim().to_string(),
                    });
                    match await_response(resp_rx)? {
                        EngineResponse::WorldDefined { remaining_quota } => {
                            println!("World saved ({remaining_quota} custom slots left).");
                        }
                        EngineResponse::WorldRejected { message } => println!("{message}"),
                        _ => bail!("unexpected engine response while defining a world"),
                    }
                }
                None => println!("usage: /world <name> :: <description>"),
            }
            continue;
        }

        let _ = cmd_tx.send(EngineCommand::SubmitInstruction(line.to_string()));
        match await_response(resp_rx)? {
            EngineResponse::TurnResolved {
                snapshot,
                narrative,
                notifications,
                ending,
                report,
            } => {
                println!("\n{narrative}\n");
                for note in &notifications {
                    println!("  * {note}");
                }
                if let Some(entry) = snapshot.history.last() {
                    if let Some(url) = &entry.image_url {
                        println!("  [illustration] {url}");
                    }
                }
                print_status(&snapshot);
                turn = snapshot.turn;

                if let Some(ending) = ending {
                    println!("\n=== {} ===", ending.title());
                    if let Some(report) = report {
                        print_report(&report);
                    }
                    println!("(/reset to play again, /quit to leave)");
                }
            }
            EngineResponse::TurnFailed { message } => {
                println!("{message} — nothing happened, try again.");
            }
            _ => bail!("unexpected engine response while resolving a turn"),
        }
    }

    Ok(())
}

fn await_response(resp_rx: &Receiver<EngineResponse>) -> Result<EngineResponse> {
    resp_rx.recv().context("the engine stopped responding")
}

fn ask(label: &str, default: &str) -> Result<String> {
    print!("{label} [{default}]: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();
    Ok(if line.is_empty() { default.to_string() } else { line.to_string() })
}

fn print_status(state: &GameState) {
    let mut status = format!("HP {}/100", state.health);
    if let Some(bond) = state.bond {
        status.push_str(&format!(" | bond {bond}/100"));
    }
    for (name, value) in &state.attributes {
        status.push_str(&format!(" | {name} {value}/100"));
    }
    if state.inventory.is_empty() {
        status.push_str(" | pack: empty");
    } else {
        status.push_str(&format!(" | pack: {}", state.inventory.join(", ")));
    }
    println!("[{status}]");
}

fn print_report(report: &FinalReport) {
    if let Some(epitaph) = &report.epitaph {
        println!("{epitaph}");
    }
    println!(
        "Survived {} turn(s). Final HP {}/100.",
        report.turns_survived, report.health
    );
}
