//! CSS Cascading and Inheritance Level 4: Cascade ordering, inheritance and shorthands.
//! Reference: <https://www.w3.org/TR/css-cascade-4/>

#![forbid(unsafe_code)]

mod properties;
mod selectors;

pub use properties::{is_inherited_property, is_shorthand, longhands_of};
pub use selectors::{
    ComplexSelector, ElementView, SelectorList, Specificity, parse_selector_list,
};

use core::cmp::Ordering;

/// Style origins, lowest priority first.
/// §6.1: Cascading origins
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    UserAgent,
    User,
    Author,
}

/// Priority tuple used to order declarations in the cascade.
/// §6: Cascading
#[derive(Clone, Copy, Debug)]
pub struct CascadePriority {
    /// §6.1: Origins
    pub origin: Origin,
    /// §6.4: Importance
    pub important: bool,
    /// Inline `style` attribute declarations beat any selector.
    pub inline: bool,
    /// Selectors 4 §17: Specificity
    pub specificity: Specificity,
    /// Source order index, increasing with appearance.
    pub source_order: u32,
}

/// Compare two `CascadePriority` values according to the cascade rules.
/// Returns `Ordering::Greater` if `left` should win over `right`.
/// §6: Sorting the cascade
pub fn compare_priority(left: &CascadePriority, right: &CascadePriority) -> Ordering {
    if left.important != right.important {
        return left.important.cmp(&right.important);
    }

    // Normal declarations: UA < User < Author. Important ones reverse the origins.
    let left_rank = origin_rank(left.origin);
    let right_rank = origin_rank(right.origin);
    if left_rank != right_rank {
        return if left.important {
            right_rank.cmp(&left_rank)
        } else {
            left_rank.cmp(&right_rank)
        };
    }

    if left.inline != right.inline {
        return left.inline.cmp(&right.inline);
    }

    if left.specificity != right.specificity {
        return left.specificity.cmp(&right.specificity);
    }

    left.source_order.cmp(&right.source_order)
}

/// Rank origins: UA < User < Author.
const fn origin_rank(origin: Origin) -> i32 {
    match origin {
        Origin::UserAgent => 0,
        Origin::User => 1,
        Origin::Author => 2,
    }
}

/// Index of the winning candidate, if any.
pub fn winning_index(candidates: &[CascadePriority]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .max_by(|(_, left), (_, right)| compare_priority(left, right))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority(origin: Origin, important: bool, specificity: (u16, u16, u16), order: u32) -> CascadePriority {
        CascadePriority {
            origin,
            important,
            inline: false,
            specificity: Specificity(specificity.0, specificity.1, specificity.2),
            source_order: order,
        }
    }

    #[test]
    fn important_user_agent_beats_important_author() {
        let author = priority(Origin::Author, true, (1, 0, 0), 2);
        let agent = priority(Origin::UserAgent, true, (0, 0, 1), 1);
        assert_eq!(compare_priority(&agent, &author), Ordering::Greater);
        let normal = priority(Origin::Author, false, (9, 9, 9), 9);
        assert_eq!(winning_index(&[normal, author, agent]), Some(2));
    }

    #[test]
    fn specificity_then_source_order() {
        let early = priority(Origin::Author, false, (0, 1, 0), 1);
        let late = priority(Origin::Author, false, (0, 1, 0), 5);
        let id = priority(Origin::Author, false, (1, 0, 0), 0);
        assert_eq!(winning_index(&[early, late]), Some(1));
        assert_eq!(winning_index(&[early, late, id]), Some(2));
    }
}
