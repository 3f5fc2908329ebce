use std::collections::{HashMap, HashSet};

use crate::account::AccountId;

/// A retired identity and where (and when) its history went.
#[derive(Debug, Clone)]
pub struct MergeLink {
    pub into: AccountId,
    pub at: u64,
}

/// Maps retired account ids to the account they were merged into. Chains
/// resolve transitively: if B merged into A and A later merged into C,
/// both B and A resolve to C.
#[derive(Debug, Default)]
pub struct MergeMap {
    links: HashMap<AccountId, MergeLink>,
}

impl MergeMap {
    pub fn record(&mut self, secondary: &str, primary: &str, at: u64) {
        self.links.insert(
            secondary.to_owned(),
            MergeLink {
                into: primary.to_owned(),
                at,
            },
        );
    }

    /// Retired ids stay reserved forever, so this also answers "may this
    /// id be created afresh".
    pub fn is_retired(&self, id: &str) -> bool {
        self.links.contains_key(id)
    }

    /// Follows the merge chain to the surviving account whose physical
    /// history holds `id`'s entries. Returns `id` itself when it was never
    /// retired.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        while let Some(link) = self.links.get(current) {
            current = &link.into;
        }
        current
    }

    /// The identity that owned `id`'s funds at `time_at`: the chain is
    /// followed only across merges that had already happened by then.
    pub fn owner_at<'a>(&'a self, id: &'a str, time_at: u64) -> &'a str {
        let mut current = id;
        while let Some(link) = self.links.get(current) {
            if link.at > time_at {
                break;
            }
            current = &link.into;
        }
        current
    }

    /// Every identity whose history had been folded into `id` by
    /// `time_at`, `id` included. Point-in-time balance queries use this
    /// set to cut a combined history down to the sub-histories that
    /// belonged to `id` at that moment.
    pub fn folded_into_at<'a>(&'a self, id: &'a str, time_at: u64) -> HashSet<&'a str> {
        let mut owned = HashSet::from([id]);
        let mut frontier = vec![id];
        while let Some(target) = frontier.pop() {
            for (retired, link) in &self.links {
                if link.into == target && link.at <= time_at && owned.insert(retired.as_str()) {
                    frontier.push(retired.as_str());
                }
            }
        }
        owned
    }
}
