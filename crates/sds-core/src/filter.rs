//! Keep/delete filters over metadata lists.
//!
//! Both operations partition a list against a set of names in a single
//! pass and drop the discarded partition. The kept partition comes back
//! in the *reverse* of first-encountered order: the original
//! implementation partitioned onto the heads of two lists, and that
//! ordering quirk is part of the observable contract, so it is
//! reproduced here rather than fixed.

use crate::attribute::Attribute;
use crate::dimension::Dimension;
use crate::variable::Variable;

/// Anything that can be filtered by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Attribute {
    fn name(&self) -> &str {
        self.name()
    }
}

impl Named for Dimension {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Variable {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Keep the entries whose names appear in `names`; drop the rest.
pub fn keep<T: Named>(list: Vec<T>, names: &[&str]) -> Vec<T> {
    partition(list, |e| names.contains(&e.name()))
}

/// Drop the entries whose names appear in `names`; keep the rest.
pub fn delete<T: Named>(list: Vec<T>, names: &[&str]) -> Vec<T> {
    partition(list, |e| !names.contains(&e.name()))
}

fn partition<T: Named>(list: Vec<T>, kept: impl Fn(&T) -> bool) -> Vec<T> {
    let mut out = Vec::new();
    for entry in list {
        if kept(&entry) {
            out.push(entry);
        }
        // non-members drop here, releasing their owned storage
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[&str]) -> Vec<Dimension> {
        names
            .iter()
            .map(|n| Dimension::new(*n, 1, false))
            .collect()
    }

    #[test]
    fn keep_and_delete_partition_the_name_set_exactly() {
        let all = ["time", "lat", "lon", "lev"];
        let set = ["lat", "lev"];

        let kept = keep(dims(&all), &set);
        let deleted = delete(dims(&all), &set);

        let mut kept_names: Vec<&str> = kept.iter().map(|d| d.name.as_str()).collect();
        let mut deleted_names: Vec<&str> = deleted.iter().map(|d| d.name.as_str()).collect();
        kept_names.sort_unstable();
        deleted_names.sort_unstable();

        assert_eq!(kept_names, vec!["lat", "lev"]);
        assert_eq!(deleted_names, vec!["lon", "time"]);
        for n in kept_names {
            assert!(!deleted_names.contains(&n), "{n} appears in both outputs");
        }
    }

    #[test]
    fn kept_partition_order_is_reversed() {
        let kept = keep(dims(&["a", "b", "c"]), &["a", "c"]);
        let names: Vec<&str> = kept.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn empty_name_set_deletes_nothing() {
        let kept = delete(dims(&["x", "y"]), &[]);
        assert_eq!(kept.len(), 2);
    }
}
