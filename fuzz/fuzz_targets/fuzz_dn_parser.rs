#![no_main]

use ldapmock::directory::Dn;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(dn) = Dn::parse(data) {
        // The printed form must parse back to an equal DN
        let printed = dn.to_string();
        let reparsed = Dn::parse(&printed).expect("printed DN must parse");
        assert_eq!(dn, reparsed, "{data:?} printed as {printed:?}");
        let _ = dn.parent();
    }
});
