use std::collections::BTreeSet;

use tracing::debug;

use super::encode::{encode_runs, EntityLog};
use super::types::{Chain, Run, SequenceSpec};
use crate::source::StateTable;

/// Finds every chain of consecutive runs that satisfies a template.
pub struct SequenceMatcher<'a> {
    spec: &'a SequenceSpec,
    states: &'a StateTable,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(spec: &'a SequenceSpec, states: &'a StateTable) -> Self {
        Self { spec, states }
    }

    pub fn match_logs<'l, I>(&self, logs: I) -> Vec<Chain>
    where
        I: IntoIterator<Item = &'l EntityLog>,
    {
        logs.into_iter()
            .flat_map(|log| self.match_entity(log))
            .collect()
    }

    pub fn match_entity(&self, log: &EntityLog) -> Vec<Chain> {
        let runs = encode_runs(log, self.states);
        let vocabulary = self.spec.vocabulary();
        let mut chains = Vec::new();
        for chain in candidate_chains(self.spec, &runs) {
            if covers_vocabulary_frames(&chain, log, self.states, &vocabulary) {
                chains.push(chain);
            } else {
                debug!(
                    target: "clipseek.sequence",
                    match_id = %chain.match_id,
                    entity = chain.entity_id,
                    start = chain.sequence_start,
                    end = chain.sequence_end,
                    "discarding chain with unaccounted frames"
                );
            }
        }
        chains
    }
}

/// Every window of `spec.len()` consecutive runs whose runs satisfy the
/// steps pairwise. Chains may overlap.
pub fn candidate_chains(spec: &SequenceSpec, runs: &[Run]) -> Vec<Chain> {
    let steps = spec.steps();
    if steps.is_empty() || runs.len() < steps.len() {
        return Vec::new();
    }
    runs.windows(steps.len())
        .filter(|window| steps.iter().zip(window.iter()).all(|(s, r)| s.accepts(r)))
        .map(|window| {
            let first = &window[0];
            let last = &window[window.len() - 1];
            Chain {
                match_id: first.match_id.clone(),
                entity_id: first.entity_id,
                sequence_start: first.start_frame,
                sequence_end: last.end_frame,
                runs: window.to_vec(),
            }
        })
        .collect()
}

/// Every frame of the chain's entity inside the chain span whose state is in
/// the template vocabulary must fall inside one of the chain's runs with that
/// same state name.
pub fn covers_vocabulary_frames(
    chain: &Chain,
    log: &EntityLog,
    states: &StateTable,
    vocabulary: &BTreeSet<&str>,
) -> bool {
    let from = log
        .frames
        .partition_point(|f| f.frame_number < chain.sequence_start);
    log.frames[from..]
        .iter()
        .take_while(|f| f.frame_number <= chain.sequence_end)
        .all(|frame| {
            let name = states.name_of(frame.state_id);
            if !vocabulary.contains(name.as_ref()) {
                return true;
            }
            chain.runs.iter().any(|run| {
                run.state_name == name
                    && frame.frame_number >= run.start_frame
                    && frame.frame_number <= run.end_frame
            })
        })
}
