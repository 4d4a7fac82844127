use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    NewProject,
    ImproveProject,
}

/// The unit of work chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    NewProject,
    ImproveProject { target: String },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::NewProject => TaskKind::NewProject,
            Task::ImproveProject { .. } => TaskKind::ImproveProject,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::NewProject => f.write_str("new project"),
            Task::ImproveProject { target } => write!(f, "improve {target}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Pure decision: with no projects there is nothing to improve; otherwise a
/// uniform `draw` in `[0, 1)` below `new_probability` picks a new project.
pub fn decide(has_projects: bool, draw: f64, new_probability: f64) -> TaskKind {
    if !has_projects || draw < new_probability {
        TaskKind::NewProject
    } else {
        TaskKind::ImproveProject
    }
}

/// Choose this run's task from the full set of known projects.
///
/// The improve target is uniform over `known`; there is no recency weighting
/// and freshly created projects are eligible.
pub fn select<R: Rng + ?Sized>(known: &[String], new_probability: f64, rng: &mut R) -> Task {
    let draw: f64 = rng.gen();
    match decide(!known.is_empty(), draw, new_probability) {
        TaskKind::NewProject => Task::NewProject,
        TaskKind::ImproveProject => {
            let target = known[rng.gen_range(0..known.len())].clone();
            Task::ImproveProject { target }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    const P: f64 = 3.0 / 8.0;

    #[test]
    fn bootstrap_always_creates() {
        for draw in [0.0, 0.374, 0.375, 0.5, 0.999_999] {
            assert_eq!(decide(false, draw, P), TaskKind::NewProject);
        }
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert_eq!(select(&[], P, &mut rng), Task::NewProject);
        }
    }

    #[test]
    fn draw_threshold() {
        assert_eq!(decide(true, 0.0, P), TaskKind::NewProject);
        assert_eq!(decide(true, 0.374, P), TaskKind::NewProject);
        assert_eq!(decide(true, 0.375, P), TaskKind::ImproveProject);
        assert_eq!(decide(true, 0.99, P), TaskKind::ImproveProject);
    }

    #[test]
    fn long_run_ratio_approaches_three_to_five() {
        let known: Vec<String> = vec!["a".into(), "b".into()];
        let mut rng = StdRng::seed_from_u64(0x1DEA);
        let runs = 40_000;
        let new = (0..runs)
            .filter(|_| select(&known, P, &mut rng) == Task::NewProject)
            .count();
        let ratio = new as f64 / runs as f64;
        assert!((ratio - P).abs() < 0.01, "ratio {ratio}");
    }

    #[test]
    fn targets_are_uniform_over_known_set() {
        let known: Vec<String> = (0..4).map(|i| format!("p{i}")).collect();
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut improves = 0;
        for _ in 0..40_000 {
            if let Task::ImproveProject { target } = select(&known, P, &mut rng) {
                *counts.entry(target).or_default() += 1;
                improves += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        for (name, n) in counts {
            let share = n as f64 / improves as f64;
            assert!((share - 0.25).abs() < 0.02, "{name}: {share}");
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let known: Vec<String> = vec!["x".into(), "y".into(), "z".into()];
        let a: Vec<Task> = {
            let mut rng = StdRng::seed_from_u64(5);
            (0..50).map(|_| select(&known, P, &mut rng)).collect()
        };
        let b: Vec<Task> = {
            let mut rng = StdRng::seed_from_u64(5);
            (0..50).map(|_| select(&known, P, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn task_display() {
        assert_eq!(Task::NewProject.to_string(), "new project");
        assert_eq!(
            Task::ImproveProject {
                target: "alpha".into()
            }
            .to_string(),
            "improve alpha"
        );
    }
}
