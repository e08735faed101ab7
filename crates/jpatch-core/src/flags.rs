use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FlagError;

/// Individual switches that shape the rendered patch.
///
/// Flags never change the document a patch produces, only which operations
/// are used to get there and which optional members they carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffFlag {
    /// Render `remove` operations without the removed value.
    OmitValueOnRemove,
    /// Do not rewrite remove/add pairs into `move`.
    OmitMoveOperation,
    /// Do not rewrite adds of existing values into `copy`.
    OmitCopyOperation,
    /// Attach the previous value to `replace` operations as `fromValue`.
    AddOriginalValueOnReplace,
    /// Render `replace` as a `remove` followed by an `add`.
    AddExplicitRemoveAddOnReplace,
    /// Precede destructive operations with a `test` of the value they discard.
    EmitTestOperations,
}

impl DiffFlag {
    const ALL: [Self; 6] = [
        Self::OmitValueOnRemove,
        Self::OmitMoveOperation,
        Self::OmitCopyOperation,
        Self::AddOriginalValueOnReplace,
        Self::AddExplicitRemoveAddOnReplace,
        Self::EmitTestOperations,
    ];

    /// The canonical name of the flag.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::OmitValueOnRemove => "OMIT_VALUE_ON_REMOVE",
            Self::OmitMoveOperation => "OMIT_MOVE_OPERATION",
            Self::OmitCopyOperation => "OMIT_COPY_OPERATION",
            Self::AddOriginalValueOnReplace => "ADD_ORIGINAL_VALUE_ON_REPLACE",
            Self::AddExplicitRemoveAddOnReplace => "ADD_EXPLICIT_REMOVE_ADD_ON_REPLACE",
            Self::EmitTestOperations => "EMIT_TEST_OPERATIONS",
        }
    }
}

impl fmt::Display for DiffFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiffFlag {
    type Err = FlagError;

    /// ```
    /// # use jpatch_core::DiffFlag;
    /// let flag: DiffFlag = "OMIT_MOVE_OPERATION".parse()?;
    /// assert_eq!(flag, DiffFlag::OmitMoveOperation);
    /// # Ok::<(), jpatch_core::FlagError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| FlagError::UnknownFlag(s.to_owned()))
    }
}

/// Immutable set of [`DiffFlag`]s passed to [`diff_with_flags`](crate::diff_with_flags).
///
/// ```
/// # use jpatch_core::{DiffFlag, DiffFlags};
/// let flags = DiffFlags::defaults().without(DiffFlag::OmitValueOnRemove);
/// assert!(!flags.contains(DiffFlag::OmitValueOnRemove));
/// assert!(DiffFlags::defaults().contains(DiffFlag::OmitValueOnRemove));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffFlags {
    flags: BTreeSet<DiffFlag>,
}

impl Default for DiffFlags {
    fn default() -> Self {
        Self::defaults()
    }
}

impl DiffFlags {
    /// The default set: only [`DiffFlag::OmitValueOnRemove`].
    #[must_use]
    pub fn defaults() -> Self {
        Self::empty().with(DiffFlag::OmitValueOnRemove)
    }

    /// A set with no flags at all.
    #[must_use]
    pub fn empty() -> Self {
        Self { flags: BTreeSet::new() }
    }

    /// The defaults plus both normalization opt-outs, so only `add`,
    /// `remove`, and `replace` are emitted.
    ///
    /// ```
    /// # use jpatch_core::{DiffFlag, DiffFlags};
    /// let flags = DiffFlags::dont_normalize_op_into_move_and_copy();
    /// assert!(flags.contains(DiffFlag::OmitMoveOperation));
    /// assert!(flags.contains(DiffFlag::OmitCopyOperation));
    /// ```
    #[must_use]
    pub fn dont_normalize_op_into_move_and_copy() -> Self {
        Self::defaults().with(DiffFlag::OmitMoveOperation).with(DiffFlag::OmitCopyOperation)
    }

    /// Returns a copy of the set with `flag` added.
    #[must_use]
    pub fn with(mut self, flag: DiffFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    /// Returns a copy of the set with `flag` removed.
    #[must_use]
    pub fn without(mut self, flag: DiffFlag) -> Self {
        self.flags.remove(&flag);
        self
    }

    /// Indicates whether `flag` is set.
    #[must_use]
    pub fn contains(&self, flag: DiffFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Iterates the set in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = DiffFlag> + '_ {
        self.flags.iter().copied()
    }

    pub(crate) fn moves_enabled(&self) -> bool {
        !self.contains(DiffFlag::OmitMoveOperation)
    }

    pub(crate) fn copies_enabled(&self) -> bool {
        !self.contains(DiffFlag::OmitCopyOperation)
    }
}

impl FromIterator<DiffFlag> for DiffFlags {
    fn from_iter<T: IntoIterator<Item = DiffFlag>>(iter: T) -> Self {
        Self { flags: iter.into_iter().collect() }
    }
}
