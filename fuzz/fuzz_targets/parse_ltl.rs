#![no_main]
use libfuzzer_sys::fuzz_target;
use trail_ltl::Formula;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(formula) = Formula::parse(s) {
            let printed = formula.to_string();
            let reparsed = Formula::parse(&printed).expect("printed formula must parse");
            assert_eq!(reparsed, formula, "{printed}");
            let _ = formula.negate().to_nnf();
        }
    }
});
