use std::sync::mpsc::{Receiver, Sender};

use log::debug;

use crate::engine::llm_client::Oracle;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::session::Session;
use crate::model::world::WorldLibrary;

/// Command-loop engine. Owns the live session, the world library and the
/// oracle; the presentation layer drives it over a channel pair and only
/// ever sees state snapshots.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    oracle: Box<dyn Oracle + Send>,
    library: WorldLibrary,
    session: Option<Session>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        oracle: Box<dyn Oracle + Send>,
    ) -> Self {
        Self {
            rx,
            tx,
            oracle,
            library: WorldLibrary::default(),
            session: None,
        }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::StartSession {
                    scenario,
                    protagonist,
                    companion,
                } => {
                    let Some(def) = self.library.resolve(&scenario) else {
                        let _ = self
                            .tx
                            .send(EngineResponse::UnknownScenario { key: scenario });
                        continue;
                    };
                    debug!("starting session in \"{}\"", def.title);
                    let session = Session::new(def.clone(), protagonist, companion);
                    let snapshot = session.state().clone();
                    self.session = Some(session);
                    let _ = self.tx.send(EngineResponse::SessionStarted {
                        scenario: def,
                        snapshot,
                    });
                }

                EngineCommand::SubmitInstruction(instruction) => {
                    let Some(session) = self.session.as_mut() else {
                        let _ = self.tx.send(EngineResponse::NoSession);
                        continue;
                    };
                    match session.run_turn(self.oracle.as_ref(), &instruction) {
                        Ok(outcome) => {
                            let snapshot = session.state().clone();
                            let report = snapshot.final_report.clone();
                            let _ = self.tx.send(EngineResponse::TurnResolved {
                                snapshot,
                                narrative: outcome.narrative,
                                notifications: outcome.notifications,
                                ending: outcome.ending,
                                report,
                            });
                        }
                        Err(err) => {
                            let _ = self.tx.send(EngineResponse::TurnFailed {
                                message: err.to_string(),
                            });
                        }
                    }
                }

                EngineCommand::DefineWorld { name, description } => {
                    let response = match self.library.define(&name, &description) {
                        Ok(()) => EngineResponse::WorldDefined {
                            remaining_quota: self.library.remaining_quota(),
                        },
                        Err(err) => EngineResponse::WorldRejected {
                            message: err.to_string(),
                        },
                    };
                    let _ = self.tx.send(response);
                }

                EngineCommand::ListWorlds => {
                    let _ = self.tx.send(EngineResponse::WorldList {
                        builtin: self.library.builtin().to_vec(),
                        custom: self.library.custom_names().map(String::from).collect(),
                        remaining_quota: self.library.remaining_quota(),
                    });
                }

                EngineCommand::Reset => {
                    let Some(session) = self.session.as_mut() else {
                        let _ = self.tx.send(EngineResponse::NoSession);
                        continue;
                    };
                    debug!("resetting \"{}\"", session.scenario().title);
                    session.reset();
                    let _ = self.tx.send(EngineResponse::SessionReset {
                        snapshot: session.state().clone(),
                    });
                }

                EngineCommand::Shutdown => break,
            }
        }
    }
}
