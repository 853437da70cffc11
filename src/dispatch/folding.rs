//! Variadic argument folding.

use tracing::trace;

use hostbridge_core::GuestValue;
use hostbridge_registry::HostProcedure;

/// Fold trailing guest arguments into one array for a variadic candidate.
///
/// The first candidate with a variadic tail whose fixed prefix fits the
/// argument list decides: everything past the prefix is packed into a new
/// guest array. A single trailing argument that is already an array is passed
/// through as the tail. Without such a candidate the arguments are unchanged.
pub fn fold_variadic(candidates: &[HostProcedure], args: &[GuestValue]) -> Vec<GuestValue> {
    let Some(prefix) = candidates
        .iter()
        .filter_map(|c| c.signature.variadic_prefix_len())
        .find(|&prefix| prefix <= args.len())
    else {
        return args.to_vec();
    };

    let (fixed, trailing) = args.split_at(prefix);
    if trailing.len() == 1 && trailing[0].is_array() {
        return args.to_vec();
    }

    trace!(prefix, packed = trailing.len(), "folding variadic arguments");
    let mut folded = Vec::with_capacity(prefix + 1);
    folded.extend_from_slice(fixed);
    folded.push(GuestValue::array(trailing.iter().cloned()));
    folded
}
