use anyhow::{bail, Result};

/// Best and worst skills by return.
///
/// Ties resolve to the lowest skill index, so returns `[5, 5, 3]` rank skill 0 best.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillRanking {
    returns: Vec<f64>,
    best: usize,
    worst: usize,
}

impl SkillRanking {
    pub fn from_returns(returns: Vec<f64>) -> Result<Self> {
        if returns.is_empty() {
            bail!("Cannot rank an empty set of skills");
        }

        let mut best = 0;
        let mut worst = 0;
        for (skill, value) in returns.iter().enumerate().skip(1) {
            if *value > returns[best] {
                best = skill;
            }

            if *value < returns[worst] {
                worst = skill;
            }
        }

        Ok(Self {
            returns,
            best,
            worst,
        })
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn num_skills(&self) -> usize {
        self.returns.len()
    }

    pub fn best(&self) -> usize {
        self.best
    }

    pub fn worst(&self) -> usize {
        self.worst
    }

    pub fn best_return(&self) -> f64 {
        self.returns[self.best]
    }

    pub fn worst_return(&self) -> f64 {
        self.returns[self.worst]
    }
}
