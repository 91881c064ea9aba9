#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (f64, u16, u16)| {
    let (a, n, r) = data;
    // Validation and root finding must never panic on any input.
    if let Ok(request) = binoplan_prob::InverseRequest::new(a, u64::from(n), u64::from(r)) {
        if let Ok(result) = binoplan_prob::solve_inverse_p(&request) {
            assert!(result.p > 0.0 && result.p < 1.0);
            assert!(result.abs_error <= 1e-6);
        }
    }
});
