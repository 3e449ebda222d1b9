//! Ownership changes between two ring states.

use std::collections::BTreeSet;

use tokenring_types::{MAX_TOKEN, MIN_TOKEN, Token, TokenRange};

use crate::ring::Ring;

/// A token range that changes owner between two ring states.
///
/// Every key whose token falls in `range` was owned by `from` and is now
/// owned by `to`; the caller moves those keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Tokens that change owner.
    pub range: TokenRange,
    /// The node that owned the range before the change.
    pub from: String,
    /// The node that owns the range after the change.
    pub to: String,
}

impl Ring {
    /// Compute the token ranges whose owner differs between `old` and `new`.
    ///
    /// The token space is cut at every vnode token of either ring. Within one
    /// such segment no ring has a vnode before the segment's end, so the
    /// owner at the end token owns the whole segment in both rings. Adjacent
    /// segments moving between the same pair of nodes are merged.
    ///
    /// Returns nothing when either ring is empty: there is no owner to move
    /// data from or to.
    pub fn diff(old: &Ring, new: &Ring) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        if old.is_empty() || new.is_empty() {
            return transfers;
        }

        let boundaries: BTreeSet<Token> = old
            .tokens()
            .chain(new.tokens())
            .map(|(token, _)| token)
            .collect();

        // `start` is None once a boundary sits on MAX_TOKEN.
        let mut start = Some(MIN_TOKEN);
        for end in boundaries {
            if let Some(segment_start) = start {
                let segment = TokenRange::new(segment_start, end);
                record(&mut transfers, old, new, segment);
            }
            start = end.checked_add(1);
        }

        // Tail past the last vnode, owned by the wraparound vnode.
        if let Some(segment_start) = start {
            let tail = TokenRange::new(segment_start, MAX_TOKEN);
            record(&mut transfers, old, new, tail);
        }

        transfers
    }
}

fn record(transfers: &mut Vec<Transfer>, old: &Ring, new: &Ring, range: TokenRange) {
    let token = range.end;
    let (Ok(from), Ok(to)) = (old.owner_of_token(token), new.owner_of_token(token)) else {
        return;
    };
    if from == to {
        return;
    }

    if let Some(last) = transfers.last_mut()
        && last.from == from
        && last.to == to
        && i64::from(last.range.end) + 1 == i64::from(range.start)
    {
        last.range.end = range.end;
        return;
    }

    transfers.push(Transfer {
        range,
        from: from.to_string(),
        to: to.to_string(),
    });
}
