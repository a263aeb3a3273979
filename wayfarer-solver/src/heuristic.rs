//! Greedy construction followed by 2-opt improvement.
//!
//! Used above the exact-search bound. Every candidate order is re-evaluated
//! in full because leg figures depend on departure time, so reversing a
//! segment changes the cost of every later leg.

use wayfarer_core::{ItineraryKind, WeatherProvider};

use crate::search::{SearchContext, Step, Tour};

/// Best tour found by nearest-neighbour construction and 2-opt, or `None`
/// when no greedy construction completes.
pub(crate) fn search<W: WeatherProvider>(
    ctx: &SearchContext<'_, W>,
    pass_budget: usize,
) -> Option<Tour> {
    let starts: Vec<usize> = match ctx.fixed_start {
        Some(start) => vec![start],
        None => (0..ctx.stop_count)
            .filter(|&i| ctx.fixed_end != Some(i))
            .collect(),
    };
    let mut best: Option<Tour> = None;
    for start in starts {
        let Some(tour) = greedy(ctx, start).and_then(|order| ctx.tour(&order)) else {
            continue;
        };
        if best.as_ref().is_none_or(|current| tour.improves_on(current)) {
            best = Some(tour);
        }
    }
    best.map(|tour| two_opt(ctx, tour, pass_budget))
}

/// Visit the cheapest next waypoint from the current position until none
/// remain, keeping a fixed end for last.
fn greedy<W: WeatherProvider>(ctx: &SearchContext<'_, W>, start: usize) -> Option<Vec<usize>> {
    let n = ctx.stop_count;
    let mut order = Vec::with_capacity(n);
    let mut remaining: Vec<usize> = (0..n).filter(|&i| i != start).collect();
    order.push(start);
    let mut progress = ctx.start();
    let mut current = start;

    while !remaining.is_empty() {
        let must_close = remaining.len() == 1;
        let mut best: Option<(usize, Step)> = None;
        for (slot, &next) in remaining.iter().enumerate() {
            if ctx.fixed_end == Some(next) && !must_close {
                continue;
            }
            let Some(step) = ctx.step(current, next, progress.departure) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, chosen)| step.score < chosen.score) {
                best = Some((slot, step));
            }
        }
        let (slot, step) = best?;
        let next = remaining.remove(slot);
        order.push(next);
        progress = ctx.advance(progress, &step);
        current = next;
    }
    Some(order)
}

/// Reverse segments while doing so strictly improves the tour, for at most
/// `pass_budget` passes.
fn two_opt<W: WeatherProvider>(
    ctx: &SearchContext<'_, W>,
    mut best: Tour,
    pass_budget: usize,
) -> Tour {
    let n = ctx.stop_count;
    let first = usize::from(ctx.fixed_start.is_some() || ctx.itinerary == ItineraryKind::Closed);
    let last = if ctx.fixed_end.is_some() {
        n.saturating_sub(2)
    } else {
        n.saturating_sub(1)
    };

    for pass in 0..pass_budget {
        let mut improved = false;
        for i in first..last {
            for j in (i + 1)..=last {
                let mut candidate = best.order.clone();
                if let Some(segment) = candidate.get_mut(i..=j) {
                    segment.reverse();
                }
                if let Some(tour) = ctx.tour(&candidate)
                    && tour.improves_on(&best)
                {
                    best = tour;
                    improved = true;
                }
            }
        }
        if !improved {
            log::debug!("2-opt converged after {} pass(es)", pass + 1);
            return best;
        }
    }
    log::debug!("2-opt stopped at the pass budget of {pass_budget}");
    best
}
