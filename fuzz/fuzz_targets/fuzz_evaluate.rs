#![no_main]
use libfuzzer_sys::fuzz_target;
use binoplan_prob::{evaluate_plan, PlanRequest, TestCase};

fuzz_target!(|data: (f64, f64, f64, f64, bool, u32, u32)| {
    let (p0, p1, alpha, beta, upper, n, r) = data;
    let case = if upper {
        TestCase::UpperTailed
    } else {
        TestCase::LowerTailed
    };
    let Ok(request) = PlanRequest::new(p0, p1, alpha, beta, case) else {
        return;
    };
    if let Ok(eval) = evaluate_plan(&request, u64::from(n), u64::from(r)) {
        assert!((-1e-9..=1.0 + 1e-9).contains(&eval.actual_alpha));
        assert!((-1e-9..=1.0 + 1e-9).contains(&eval.actual_beta));
    }
});
