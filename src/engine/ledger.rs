use ulid::Ulid;

use crate::model::*;

use super::sweep::{peak_in_window, Peak};

/// One engineer's partition of the ledger: committed assignments sorted by start.
#[derive(Debug, Clone)]
pub struct EngineerLedger {
    pub engineer_id: Ulid,
    assignments: Vec<Assignment>,
    /// Widest span in `assignments`; bounds how far back an overlap can start.
    longest: Ms,
}

impl EngineerLedger {
    pub fn new(engineer_id: Ulid) -> Self {
        Self {
            engineer_id,
            assignments: Vec::new(),
            longest: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn get(&self, id: Ulid) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: Ulid) -> bool {
        self.get(id).is_some()
    }

    /// Insert maintaining sort order by start.
    pub fn add(&mut self, assignment: Assignment) {
        debug_assert_eq!(assignment.engineer_id, self.engineer_id);
        let pos = self
            .assignments
            .binary_search_by_key(&assignment.start, |a| a.start)
            .unwrap_or_else(|e| e);
        self.longest = self.longest.max(assignment.span().duration_ms());
        self.assignments.insert(pos, assignment);
    }

    pub fn remove(&mut self, id: Ulid) -> Option<Assignment> {
        let pos = self.assignments.iter().position(|a| a.id == id)?;
        let removed = self.assignments.remove(pos);
        if removed.span().duration_ms() == self.longest {
            self.longest = self
                .assignments
                .iter()
                .map(|a| a.span().duration_ms())
                .max()
                .unwrap_or(0);
        }
        Some(removed)
    }

    /// Swap an assignment for a new version with the same id. Returns the
    /// previous version, or `None` (and leaves the ledger untouched) if absent.
    pub fn replace(&mut self, assignment: Assignment) -> Option<Assignment> {
        let previous = self.remove(assignment.id)?;
        self.add(assignment);
        Some(previous)
    }

    /// Assignments whose span overlaps the query.
    ///
    /// Binary search skips everything starting at or after `query.end`, and
    /// everything starting so early that even the widest span ends before
    /// `query.start`. The scan is O(log n + k + m) where m counts the
    /// non-overlapping assignments left between those bounds.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Assignment> {
        let right_bound = self
            .assignments
            .partition_point(|a| a.start < query.end);
        let left_bound = match query.start.checked_sub(self.longest) {
            Some(floor) => self.assignments[..right_bound].partition_point(|a| a.start <= floor),
            None => 0,
        };
        self.assignments[left_bound..right_bound]
            .iter()
            .filter(move |a| a.span().overlaps(query))
    }

    /// Sum of every allocation overlapping the query, regardless of whether
    /// they are concurrent.
    pub fn allocated(&self, query: &Span) -> Percent {
        self.overlapping(query).map(|a| a.allocation).sum()
    }

    /// Maximum instantaneous concurrent allocation inside the query.
    pub fn peak(&self, query: &Span, exclude: Option<Ulid>) -> Peak {
        let allocs = self
            .overlapping(query)
            .filter(|a| Some(a.id) != exclude)
            .map(|a| (a.span(), a.allocation));
        peak_in_window(allocs, query)
    }

    /// Ids of assignments active at instant `t`.
    pub fn active_at(&self, t: Ms, exclude: Option<Ulid>) -> Vec<Ulid> {
        self.overlapping(&Span::new(t, t.saturating_add(1)))
            .filter(|a| Some(a.id) != exclude)
            .map(|a| a.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(engineer_id: Ulid, allocation: Percent, start: Ms, end: Ms) -> Assignment {
        Assignment {
            id: Ulid::new(),
            engineer_id,
            project_id: Ulid::new(),
            allocation,
            start,
            end,
            role: String::new(),
        }
    }

    #[test]
    fn add_keeps_start_order() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        ledger.add(assignment(eid, 10, 300, 400));
        ledger.add(assignment(eid, 10, 100, 200));
        ledger.add(assignment(eid, 10, 200, 300));
        let starts: Vec<Ms> = ledger.assignments().iter().map(|a| a.start).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn remove_and_remove_again() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        let a = assignment(eid, 50, 0, 10);
        let id = a.id;
        ledger.add(a);
        assert!(ledger.remove(id).is_some());
        assert!(ledger.remove(id).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn replace_moves_in_order() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        let first = assignment(eid, 50, 0, 10);
        let second = assignment(eid, 50, 20, 30);
        ledger.add(first.clone());
        ledger.add(second.clone());

        let moved = Assignment {
            start: 40,
            end: 50,
            ..first.clone()
        };
        let previous = ledger.replace(moved).unwrap();
        assert_eq!(previous, first);
        assert_eq!(ledger.assignments()[0].id, second.id);
        assert_eq!(ledger.assignments()[1].id, first.id);
    }

    #[test]
    fn replace_missing_is_noop() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        ledger.add(assignment(eid, 50, 0, 10));
        assert!(ledger.replace(assignment(eid, 10, 0, 10)).is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn overlapping_uses_closed_end() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        ledger.add(assignment(eid, 50, 100, 200)); // covers instant 200
        assert_eq!(ledger.overlapping(&Window::new(200, 300).span()).count(), 1);
        assert_eq!(ledger.overlapping(&Window::new(201, 300).span()).count(), 0);
        assert_eq!(ledger.overlapping(&Window::new(0, 99).span()).count(), 0);
    }

    #[test]
    fn overlapping_skips_history_before_widest_span() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        for day in 0..50 {
            ledger.add(assignment(eid, 10, day * 10, day * 10 + 5));
        }
        let long = assignment(eid, 20, 100, 1_000);
        let long_id = long.id;
        ledger.add(long);

        let query = Window::new(600, 605).span();
        let hits: Vec<Ulid> = ledger.overlapping(&query).map(|a| a.id).collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&long_id));

        // Once the wide assignment is gone the bound tightens and the
        // short ones are still found.
        ledger.remove(long_id);
        assert_eq!(ledger.overlapping(&query).count(), 1);
        assert_eq!(ledger.overlapping(&Window::new(0, 5).span()).count(), 1);
        assert_eq!(ledger.allocated(&Span::ALL), 500);
    }

    #[test]
    fn allocated_sums_even_when_not_concurrent() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        ledger.add(assignment(eid, 60, 0, 10));
        ledger.add(assignment(eid, 60, 20, 30));
        let all = Window::new(0, 30).span();
        assert_eq!(ledger.allocated(&all), 120);
        assert_eq!(ledger.peak(&all, None).value, 60);
    }

    #[test]
    fn empty_ledger_is_zero() {
        let ledger = EngineerLedger::new(Ulid::new());
        assert_eq!(ledger.allocated(&Span::ALL), 0);
        assert_eq!(ledger.peak(&Span::ALL, None).value, 0);
    }

    #[test]
    fn peak_excludes_assignment() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        let big = assignment(eid, 80, 0, 14);
        let big_id = big.id;
        ledger.add(big);
        ledger.add(assignment(eid, 30, 5, 10));
        let w = Window::new(0, 14).span();
        assert_eq!(ledger.peak(&w, None).value, 110);
        assert_eq!(ledger.peak(&w, Some(big_id)).value, 30);
    }

    #[test]
    fn active_at_instant() {
        let eid = Ulid::new();
        let mut ledger = EngineerLedger::new(eid);
        let a = assignment(eid, 50, 0, 10);
        let b = assignment(eid, 30, 5, 20);
        let (a_id, b_id) = (a.id, b.id);
        ledger.add(a);
        ledger.add(b);
        let mut at_seven = ledger.active_at(7, None);
        at_seven.sort();
        let mut expected = vec![a_id, b_id];
        expected.sort();
        assert_eq!(at_seven, expected);
        assert_eq!(ledger.active_at(15, None), vec![b_id]);
        assert_eq!(ledger.active_at(7, Some(a_id)), vec![b_id]);
    }
}
