//! Identity matching for unordered sub-entity lists
//!
//! Sub-entities are addressed by user-chosen name, but the server assigns
//! the durable id. Across replans these heuristics re-associate stored ids
//! with renamed or reordered entries so the host engine does not destroy and
//! recreate entities spuriously. Both strategies are total: they always
//! produce a full container reassignment and are deterministic for a given
//! plan/state pair. Ambiguities are resolved with a best-effort structural
//! guess, never an error.
//!
//! Known limitation: the positional fallback in `match_for_modify` can
//! mismatch a simultaneous rename-plus-reorder (two entries renamed while
//! exchanging slots). The pairing is then positional, not intent-aware.

use modelkit::ListValue;

use crate::error::Result;
use crate::handler::Handler;
use crate::model::Model;
use crate::wire::WireValue;

/// A sub-entity that matching can address by name and id
pub trait MatchKey {
    /// Wire key under which responses carry the entity name
    const NAME_WIRE_KEY: &'static str = "name";

    /// The user-chosen name, when present
    fn match_name(&self) -> Option<&str>;

    /// The server-assigned id, when present
    fn assigned_id(&self) -> Option<&str>;

    /// Bind a server-assigned id to this entry
    fn assign_id(&mut self, id: String);

    /// Inherit identity from a previously stored entry.
    ///
    /// The default copies the stored id when this entry has none; models
    /// with nested sub-entity lists override to recurse.
    fn adopt(&mut self, prior: &Self) {
        if self.assigned_id().is_none() {
            if let Some(id) = prior.assigned_id() {
                self.assign_id(id.to_string());
            }
        }
    }
}

/// Pre-serialization matching: carry stored ids onto the planned entries.
///
/// Name pass first: every stored entry claims the first planned entry with
/// an equal name. Planned entries left unmatched are then paired, in
/// declaration order, against stored entries unclaimed by name (positional
/// fallback), which tolerates pure renames.
pub fn match_for_modify<T: MatchKey + Clone>(stored: &ListValue<T>, planned: &mut ListValue<T>) {
    if !planned.is_present() {
        return;
    }
    let stored_elements = stored.to_vec();
    let mut planned_elements = planned.to_vec();
    let mut stored_claimed = vec![false; stored_elements.len()];
    let mut planned_matched = vec![false; planned_elements.len()];

    // Name pass
    for (si, prior) in stored_elements.iter().enumerate() {
        let Some(name) = prior.match_name() else {
            continue;
        };
        for pi in 0..planned_elements.len() {
            if planned_matched[pi] {
                continue;
            }
            if planned_elements[pi].match_name() == Some(name) {
                planned_elements[pi].adopt(prior);
                planned_matched[pi] = true;
                stored_claimed[si] = true;
                break;
            }
        }
    }

    // Positional fallback over the leftovers, both sides in declaration order
    let mut unclaimed = stored_elements
        .iter()
        .zip(&stored_claimed)
        .filter_map(|(prior, claimed)| (!*claimed).then_some(prior));
    for pi in 0..planned_elements.len() {
        if planned_matched[pi] {
            continue;
        }
        let Some(prior) = unclaimed.next() else {
            break;
        };
        log::debug!(
            "positional fallback: planned entry `{}` inherits id of stored `{}`",
            planned_elements[pi].match_name().unwrap_or("<unnamed>"),
            prior.match_name().unwrap_or("<unnamed>")
        );
        planned_elements[pi].adopt(prior);
    }

    planned.set(planned_elements);
}

/// Post-deserialization matching against the authoritative server list.
///
/// Every stored entry finds a same-named response object, is updated in
/// place, and removes it from the candidate pool. Leftover pool entries are
/// appended as new; stored entries with no counterpart are dropped.
pub fn match_for_set<T: Model + MatchKey>(
    handler: &mut Handler,
    current: &mut ListValue<T>,
    response: &[WireValue],
) -> Result<()> {
    let mut pool: Vec<Option<&WireValue>> = response.iter().map(Some).collect();
    let mut rebuilt = Vec::with_capacity(response.len());

    for mut element in current.to_vec() {
        let slot = element.match_name().and_then(|name| {
            pool.iter().position(|entry| {
                entry
                    .and_then(|payload| payload.get(T::NAME_WIRE_KEY))
                    .and_then(WireValue::as_str)
                    == Some(name)
            })
        });
        match slot {
            Some(index) => {
                if let Some(payload) = pool[index].take() {
                    element.set_values(handler, payload)?;
                    rebuilt.push(element);
                }
            }
            None => {
                log::debug!(
                    "dropping stored entry `{}`: absent from server response",
                    element.match_name().unwrap_or("<unnamed>")
                );
            }
        }
    }

    // Server-side additions, in response order
    for payload in pool.into_iter().flatten() {
        let mut element = T::empty();
        element.set_values(handler, payload)?;
        rebuilt.push(element);
    }

    current.set(rebuilt);
    Ok(())
}
