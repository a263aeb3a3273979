//! Exhaustive depth-first search with branch-and-bound.
//!
//! Orders are extended one leg at a time so each shared prefix is evaluated
//! once. Waypoints are explored in index order, which is ascending id order,
//! and an incumbent is only replaced by a strictly better tour; the first
//! optimum found is therefore the lexicographically smallest one.

use wayfarer_core::{ItineraryKind, Progress, WeatherProvider};

use crate::search::{SCORE_EPSILON, SearchContext, Step, Tour};

/// Optimal tour under the context's constraints, if any order is feasible.
pub(crate) fn search<W: WeatherProvider>(ctx: &SearchContext<'_, W>) -> Option<Tour> {
    let n = ctx.stop_count;
    let mut dfs = Dfs {
        ctx,
        used: vec![false; n],
        order: Vec::with_capacity(n),
        steps: Vec::with_capacity(n),
        best: None,
        visited: 0,
    };
    dfs.extend(ctx.start(), 0.0);
    log::debug!(
        "exact search over {n} waypoints explored {} prefixes",
        dfs.visited
    );
    dfs.best
}

struct Dfs<'c, 'a, W> {
    ctx: &'c SearchContext<'a, W>,
    used: Vec<bool>,
    order: Vec<usize>,
    steps: Vec<Step>,
    best: Option<Tour>,
    visited: usize,
}

impl<W: WeatherProvider> Dfs<'_, '_, W> {
    #[expect(clippy::float_arithmetic, reason = "prefix cost accumulates leg scores")]
    fn extend(&mut self, progress: Progress, cost: f64) {
        self.visited += 1;
        if self.prunable(cost) {
            return;
        }
        if self.order.len() == self.ctx.stop_count {
            self.complete(progress, cost);
            return;
        }
        for next in 0..self.ctx.stop_count {
            if !self.admissible(next) {
                continue;
            }
            let step = match self.order.last() {
                Some(&prev) => match self.ctx.step(prev, next, progress.departure) {
                    Some(step) => Some(step),
                    None => continue,
                },
                None => None,
            };
            self.mark(next, true);
            self.order.push(next);
            match step {
                Some(step) => {
                    self.steps.push(step);
                    self.extend(self.ctx.advance(progress, &step), cost + step.score);
                    self.steps.pop();
                }
                None => self.extend(progress, cost),
            }
            self.order.pop();
            self.mark(next, false);
        }
    }

    #[expect(clippy::float_arithmetic, reason = "closing leg adds to the tour cost")]
    fn complete(&mut self, progress: Progress, cost: f64) {
        let mut steps = self.steps.clone();
        let mut objective = cost;
        if self.ctx.itinerary == ItineraryKind::Closed
            && let (Some(&last), Some(&first)) = (self.order.last(), self.order.first())
        {
            let Some(back) = self.ctx.step(last, first, progress.departure) else {
                return;
            };
            objective += back.score;
            steps.push(back);
        }
        let tour = Tour {
            order: self.order.clone(),
            steps,
            objective,
        };
        if self.best.as_ref().is_none_or(|best| tour.improves_on(best)) {
            self.best = Some(tour);
        }
    }

    #[expect(clippy::float_arithmetic, reason = "pruning bound with tolerance")]
    fn prunable(&self, cost: f64) -> bool {
        self.best
            .as_ref()
            .is_some_and(|best| cost > best.objective + SCORE_EPSILON)
    }

    fn admissible(&self, next: usize) -> bool {
        if self.used.get(next).copied().unwrap_or(true) {
            return false;
        }
        let position = self.order.len();
        let last_position = self.ctx.stop_count.saturating_sub(1);
        if position == 0 {
            return self.ctx.fixed_start.is_none_or(|start| start == next);
        }
        match self.ctx.fixed_end {
            Some(end) if end == next => position == last_position,
            Some(_) => position != last_position,
            None => true,
        }
    }

    fn mark(&mut self, index: usize, used: bool) {
        if let Some(slot) = self.used.get_mut(index) {
            *slot = used;
        }
    }
}
