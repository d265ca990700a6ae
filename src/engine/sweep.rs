use crate::model::*;

/// Result of a sweep: the highest concurrent allocation and the first instant
/// it was reached. `at` is `None` when nothing overlapped the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub value: Percent,
    pub at: Option<Ms>,
}

impl Peak {
    pub const ZERO: Peak = Peak { value: 0, at: None };
}

/// Sweep-line: maximum instantaneous sum of weighted spans inside `window`.
///
/// Each span is clamped to the window, then contributes `+weight` at its start
/// and `-weight` at its end. Ends sort before starts at the same instant
/// (spans are half-open), so back-to-back allocations never stack.
pub fn peak_in_window<I>(allocs: I, window: &Span) -> Peak
where
    I: IntoIterator<Item = (Span, Percent)>,
{
    let mut events: Vec<(Ms, i64)> = Vec::new();
    for (span, weight) in allocs {
        if weight == 0 {
            continue;
        }
        if let Some(clamped) = span.clamp_to(window) {
            events.push((clamped.start, i64::from(weight)));
            events.push((clamped.end, -i64::from(weight)));
        }
    }
    if events.is_empty() {
        return Peak::ZERO;
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut running: i64 = 0;
    let mut peak = Peak::ZERO;
    for (time, delta) in &events {
        running += delta;
        if running > i64::from(peak.value) {
            peak = Peak {
                value: Percent::try_from(running).unwrap_or(Percent::MAX),
                at: Some(*time),
            };
        }
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Ms = 86_400_000;

    fn day_window(start: Ms, end: Ms) -> Span {
        Window::new(start * D, end * D).span()
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(peak_in_window(Vec::new(), &Span::ALL), Peak::ZERO);
    }

    #[test]
    fn single_allocation() {
        let peak = peak_in_window([(day_window(0, 14), 80)], &Span::ALL);
        assert_eq!(peak, Peak { value: 80, at: Some(0) });
    }

    #[test]
    fn nested_overlap_stacks() {
        let allocs = [(day_window(0, 14), 80), (day_window(5, 10), 30)];
        let peak = peak_in_window(allocs, &Span::ALL);
        assert_eq!(peak.value, 110);
        assert_eq!(peak.at, Some(5 * D));
    }

    #[test]
    fn disjoint_allocations_do_not_stack() {
        // Two full-time assignments at different times never conflict.
        let allocs = [(day_window(0, 4), 100), (day_window(5, 9), 100)];
        assert_eq!(peak_in_window(allocs, &Span::ALL).value, 100);
    }

    #[test]
    fn back_to_back_half_open_spans_do_not_stack() {
        let allocs = [(Span::new(0, 100), 60), (Span::new(100, 200), 60)];
        assert_eq!(peak_in_window(allocs, &Span::ALL).value, 60);
    }

    #[test]
    fn shared_closed_endpoint_stacks() {
        // [0, 10] and [10, 20] both include day 10.
        let allocs = [(day_window(0, 10), 60), (day_window(10, 20), 60)];
        let peak = peak_in_window(allocs, &Span::ALL);
        assert_eq!(peak.value, 120);
        assert_eq!(peak.at, Some(10 * D));
    }

    #[test]
    fn restricted_to_window() {
        let allocs = [(day_window(0, 4), 70), (day_window(2, 3), 30), (day_window(6, 9), 20)];
        // Only the [6, 9] allocation is inside the window.
        let peak = peak_in_window(allocs, &day_window(5, 9));
        assert_eq!(peak, Peak { value: 20, at: Some(6 * D) });
    }

    #[test]
    fn staggered_three_way_overlap() {
        let allocs = [
            (Span::new(0, 100), 30),
            (Span::new(25, 75), 30),
            (Span::new(50, 150), 30),
        ];
        let peak = peak_in_window(allocs, &Span::ALL);
        assert_eq!(peak, Peak { value: 90, at: Some(50) });
    }

    #[test]
    fn zero_weight_ignored() {
        let peak = peak_in_window([(Span::new(0, 10), 0)], &Span::ALL);
        assert_eq!(peak, Peak::ZERO);
    }
}
