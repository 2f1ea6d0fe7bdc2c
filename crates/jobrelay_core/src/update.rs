use crate::{
    classify, detail_url, Command, Effect, Msg, Notice, OrchestrationState, PageKind, PageOrigin,
    PageTarget, Phase, RunOutcome,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not fit the current phase are ignored. Every path that
/// leaves `Extracting` or an earlier phase with a derived page emits exactly
/// one `Effect::ClosePage` for it.
pub fn update(mut state: OrchestrationState, msg: Msg) -> (OrchestrationState, Vec<Effect>) {
    let effects = match msg {
        Msg::Triggered {
            command,
            active_page,
            active_url,
        } => {
            if state.phase() != Phase::Idle {
                return (state, Vec::new());
            }
            if Command::parse(&command).is_none() {
                state.finish(RunOutcome::Ignored);
                return (state, Vec::new());
            }
            match classify(&active_url) {
                PageKind::CollectionView { job_id } => {
                    state.set_phase(Phase::Opening);
                    vec![Effect::OpenDerivedPage {
                        url: detail_url(&job_id),
                    }]
                }
                PageKind::DetailView => {
                    state.set_target(PageTarget {
                        page: active_page,
                        origin: PageOrigin::Original,
                    });
                    state.set_phase(Phase::Injecting);
                    vec![Effect::InjectAgent {
                        page: active_page,
                        settle: state.budget().after_injection,
                    }]
                }
                PageKind::Unsupported => {
                    state.finish(RunOutcome::Ignored);
                    Vec::new()
                }
            }
        }
        Msg::DerivedPageOpened { page } => {
            if state.phase() != Phase::Opening {
                return (state, Vec::new());
            }
            state.set_target(PageTarget {
                page,
                origin: PageOrigin::Derived,
            });
            state.set_phase(Phase::AwaitingLoad);
            vec![Effect::AwaitLoad {
                page,
                settle: state.budget().after_load,
            }]
        }
        Msg::DerivedPageFailed { .. } => {
            if state.phase() != Phase::Opening {
                return (state, Vec::new());
            }
            state.finish(RunOutcome::OpenFailed);
            Vec::new()
        }
        Msg::PageReady { page } => {
            if state.phase() != Phase::AwaitingLoad || !targets(&state, page) {
                return (state, Vec::new());
            }
            state.set_phase(Phase::Injecting);
            vec![Effect::InjectAgent {
                page,
                settle: state.budget().after_injection,
            }]
        }
        Msg::AgentInjected { page, result } => {
            if state.phase() != Phase::Injecting || !targets(&state, page) {
                return (state, Vec::new());
            }
            match result {
                Ok(()) => {
                    state.set_phase(Phase::Extracting);
                    vec![Effect::RequestExtraction { page }]
                }
                Err(_) => finalize(&mut state, RunOutcome::InjectionFailed),
            }
        }
        Msg::ExtractionReplied { page, reply } => {
            if state.phase() != Phase::Extracting || !targets(&state, page) {
                return (state, Vec::new());
            }
            match reply {
                Ok(Some(raw)) => {
                    let record = raw.normalize();
                    if record.has_identity() {
                        let mut effects = close_derived(&mut state);
                        effects.push(Effect::Submit {
                            record: record.clone(),
                        });
                        state.set_record(record);
                        state.set_phase(Phase::Relaying);
                        effects
                    } else {
                        finalize(&mut state, RunOutcome::Empty)
                    }
                }
                Ok(None) => finalize(&mut state, RunOutcome::Empty),
                Err(_) => finalize(&mut state, RunOutcome::ChannelFailed),
            }
        }
        Msg::PageLost { page, .. } => {
            let waiting = matches!(
                state.phase(),
                Phase::AwaitingLoad | Phase::Injecting | Phase::Extracting
            );
            if !waiting || !targets(&state, page) {
                return (state, Vec::new());
            }
            finalize(&mut state, RunOutcome::ChannelFailed)
        }
        Msg::RelayFinished { result } => {
            if state.phase() != Phase::Relaying {
                return (state, Vec::new());
            }
            match result {
                Ok(_) => {
                    state.finish(RunOutcome::Relayed);
                    vec![Effect::Notify(Notice::Sent)]
                }
                Err(error) => {
                    state.finish(RunOutcome::RelayFailed(error));
                    vec![Effect::Notify(Notice::Failed)]
                }
            }
        }
    };

    (state, effects)
}

fn targets(state: &OrchestrationState, page: crate::PageId) -> bool {
    state.target().is_some_and(|target| target.page == page)
}

fn close_derived(state: &mut OrchestrationState) -> Vec<Effect> {
    state
        .take_derived_for_close()
        .map(|page| Effect::ClosePage { page })
        .into_iter()
        .collect()
}

fn finalize(state: &mut OrchestrationState, outcome: RunOutcome) -> Vec<Effect> {
    let effects = close_derived(state);
    state.finish(outcome);
    effects
}
