use std::cmp::Ordering;

use crate::model::*;

/// Ranked candidates for a project. Finite; calling the matcher again yields a
/// fresh ranking against the ledger as it is then.
#[derive(Debug, Clone)]
pub struct Candidates {
    inner: std::vec::IntoIter<Candidate>,
}

impl Candidates {
    /// Keep only the first `team_size` candidates.
    pub fn shortlist(self, team_size: usize) -> Vec<Candidate> {
        self.take(team_size).collect()
    }
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Candidates {}

/// Engineers eligible for a project on skills alone.
pub fn is_eligible(engineer: &Engineer, project: &Project) -> bool {
    engineer.role == Role::Engineer && engineer.skills.covers(&project.required_skills)
}

/// Most available first, then most senior, then lowest id.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.available_capacity
        .cmp(&a.available_capacity)
        .then(b.seniority.cmp(&a.seniority))
        .then(a.engineer_id.cmp(&b.engineer_id))
}

/// Drop candidates with nothing to give and sort the rest.
pub fn rank(mut candidates: Vec<Candidate>) -> Candidates {
    candidates.retain(|c| c.available_capacity > 0);
    candidates.sort_by(compare_candidates);
    Candidates {
        inner: candidates.into_iter(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn candidate(available: i64, seniority: Seniority) -> Candidate {
        Candidate {
            engineer_id: Ulid::new(),
            available_capacity: available,
            seniority,
        }
    }

    #[test]
    fn most_available_first() {
        let low = candidate(20, Seniority::Senior);
        let high = candidate(80, Seniority::Junior);
        let ranked: Vec<_> = rank(vec![low, high]).collect();
        assert_eq!(ranked, vec![high, low]);
    }

    #[test]
    fn seniority_breaks_ties() {
        let junior = candidate(50, Seniority::Junior);
        let senior = candidate(50, Seniority::Senior);
        let mid = candidate(50, Seniority::Mid);
        let ranked: Vec<_> = rank(vec![junior, senior, mid]).collect();
        assert_eq!(ranked, vec![senior, mid, junior]);
    }

    #[test]
    fn id_breaks_remaining_ties() {
        let a = candidate(50, Seniority::Mid);
        let b = candidate(50, Seniority::Mid);
        let (first, second) = if a.engineer_id < b.engineer_id { (a, b) } else { (b, a) };
        let ranked: Vec<_> = rank(vec![second, first]).collect();
        assert_eq!(ranked, vec![first, second]);
    }

    #[test]
    fn exhausted_candidates_dropped() {
        let full = candidate(0, Seniority::Senior);
        let over = candidate(-10, Seniority::Senior);
        let free = candidate(10, Seniority::Junior);
        let ranked = rank(vec![full, over, free]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked.shortlist(5), vec![free]);
    }

    #[test]
    fn shortlist_truncates() {
        let ranked = rank((1..=5).map(|i| candidate(i * 10, Seniority::Mid)).collect());
        let top = ranked.shortlist(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].available_capacity, 50);
        assert_eq!(top[1].available_capacity, 40);
    }

    #[test]
    fn eligibility_is_superset_and_engineers_only() {
        let mut engineer = Engineer::new(Ulid::new(), Role::Engineer);
        engineer.skills = ["React", "Python"].into_iter().collect();
        let project = Project {
            id: Ulid::new(),
            name: String::new(),
            manager_id: Ulid::new(),
            required_skills: ["React"].into_iter().collect(),
            team_size: 1,
            start: 0,
            end: 10,
            status: ProjectStatus::Active,
        };
        assert!(is_eligible(&engineer, &project));

        let needs_more = Project {
            required_skills: ["React", "Go"].into_iter().collect(),
            ..project.clone()
        };
        assert!(!is_eligible(&engineer, &needs_more));

        let mut manager = engineer.clone();
        manager.role = Role::Manager;
        assert!(!is_eligible(&manager, &project));
    }
}
