// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feedback strategies: when a node's errors become visible.

use alloc::boxed::Box;
use core::ops::{BitAnd, BitOr, Not};

use crate::extras::{ClientErrors, Extras};

/// A predicate over a node's [`Extras`] and the form's submitted flag that
/// decides whether the node's errors are shown.
///
/// Strategies compose with `&`, `|` and `!`.
///
/// ```rust
/// use understory_form::{Extras, FeedbackStrategy};
///
/// let strategy = FeedbackStrategy::Touched | FeedbackStrategy::Submitted;
///
/// let mut extras = Extras::default();
/// assert!(!strategy.should_show(&extras, false));
/// assert!(strategy.should_show(&extras, true));
///
/// extras.meta.touched = true;
/// assert!(strategy.should_show(&extras, false));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FeedbackStrategy {
    /// Always show errors.
    #[default]
    Always,
    /// Show once the node has been touched.
    Touched,
    /// Show once the node has been changed.
    Changed,
    /// Show once client validation has run without errors.
    ClientValidationSucceeded,
    /// Show while the node is neither touched nor changed.
    Pristine,
    /// Show once the form has been submitted.
    Submitted,
    /// Both strategies hold.
    And(Box<Self>, Box<Self>),
    /// Either strategy holds.
    Or(Box<Self>, Box<Self>),
    /// The strategy does not hold.
    Not(Box<Self>),
}

impl FeedbackStrategy {
    /// Combines two strategies with logical and.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Combines two strategies with logical or.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Evaluates the strategy.
    #[must_use]
    pub fn should_show(&self, extras: &Extras, submitted: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Touched => extras.meta.touched,
            Self::Changed => extras.meta.changed,
            Self::ClientValidationSucceeded => {
                matches!(&extras.errors.client, ClientErrors::Checked(e) if e.is_empty())
            }
            Self::Pristine => !extras.meta.touched && !extras.meta.changed,
            Self::Submitted => submitted,
            Self::And(a, b) => a.should_show(extras, submitted) && b.should_show(extras, submitted),
            Self::Or(a, b) => a.should_show(extras, submitted) || b.should_show(extras, submitted),
            Self::Not(inner) => !inner.should_show(extras, submitted),
        }
    }
}

impl BitAnd for FeedbackStrategy {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for FeedbackStrategy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Not for FeedbackStrategy {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}
