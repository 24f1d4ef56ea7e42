//! Fixed latency tables for representative hardware profiles.

use crate::gate::is_swap_kind;

use super::{Latency, LatencyQuery};

macro_rules! fixed_latency {
    ($(#[$meta:meta])* $name:ident, $label:literal, one = $one:expr, two = $two:expr, swap = $swap:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl Latency for $name {
            fn name(&self) -> &str {
                $label
            }

            fn latency(&self, query: &LatencyQuery<'_>) -> u32 {
                if query.arity < 2 {
                    $one
                } else if is_swap_kind(query.kind) {
                    $swap
                } else {
                    $two
                }
            }

            fn clone_box(&self) -> Box<dyn Latency> {
                Box::new(*self)
            }
        }
    };
}

fixed_latency!(
    /// Every operation, swaps included, takes one cycle.
    Latency1,
    "Latency_1",
    one = 1,
    two = 1,
    swap = 1
);

fixed_latency!(
    /// 1-qubit gates take 1 cycle, 2-qubit gates 2 cycles and swaps 6 cycles.
    #[allow(non_camel_case_types)]
    Latency1_2_6,
    "Latency_1_2_6",
    one = 1,
    two = 2,
    swap = 6
);

fixed_latency!(
    /// 1-qubit gates take 1 cycle; 2-qubit gates and swaps take 3 cycles.
    #[allow(non_camel_case_types)]
    Latency1_3,
    "Latency_1_3",
    one = 1,
    two = 3,
    swap = 3
);
