/// The kind of path boolean operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    Union,
    Intersection,
    /// Bottom operand minus top operand.
    Difference,
    SymmetricDifference,
    /// Splits the bottom operand along the top operand's outline.
    Cut,
    /// Breaks the bottom operand's outline where the top operand crosses it.
    Slice,
}

impl BoolOp {
    /// Whether a region inside `in_a` and `in_b` belongs to the result.
    ///
    /// | in A | in B | Union | Intersection | Difference | SymDiff |
    /// |------|------|-------|--------------|------------|---------|
    /// | no   | no   | no    | no           | no         | no      |
    /// | yes  | no   | yes   | no           | yes        | yes     |
    /// | no   | yes  | yes   | no           | no         | yes     |
    /// | yes  | yes  | yes   | yes          | no         | no      |
    ///
    /// Cut and slice keep whatever lies inside A.
    #[allow(clippy::match_same_arms)]
    #[must_use]
    pub fn keeps(self, in_a: bool, in_b: bool) -> bool {
        match (self, in_a, in_b) {
            (Self::Union, a, b) => a || b,
            (Self::Intersection, a, b) => a && b,
            (Self::Difference, a, b) => a && !b,
            (Self::SymmetricDifference, a, b) => a != b,
            (Self::Cut, a, _) => a,
            (Self::Slice, a, _) => a,
        }
    }

    /// Operations that only accept two operands and depend on their z-order.
    #[must_use]
    pub fn is_binary(self) -> bool {
        !matches!(self, Self::Union | Self::Intersection)
    }

    /// Cut and slice use the top operand as a cutting curve.
    #[must_use]
    pub fn is_cutting(self) -> bool {
        matches!(self, Self::Cut | Self::Slice)
    }

    /// Human-readable name used in logs and undo labels.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Union => "Union",
            Self::Intersection => "Intersection",
            Self::Difference => "Difference",
            Self::SymmetricDifference => "Exclusion",
            Self::Cut => "Division",
            Self::Slice => "Cut path",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_any_coverage() {
        assert!(BoolOp::Union.keeps(true, false));
        assert!(BoolOp::Union.keeps(false, true));
        assert!(!BoolOp::Union.keeps(false, false));
    }

    #[test]
    fn difference_removes_b() {
        assert!(BoolOp::Difference.keeps(true, false));
        assert!(!BoolOp::Difference.keeps(true, true));
        assert!(!BoolOp::Difference.keeps(false, true));
    }

    #[test]
    fn symmetric_difference_is_exclusive() {
        assert!(BoolOp::SymmetricDifference.keeps(false, true));
        assert!(!BoolOp::SymmetricDifference.keeps(true, true));
    }

    #[test]
    fn arity_and_cutting_flags() {
        assert!(!BoolOp::Union.is_binary());
        assert!(BoolOp::Difference.is_binary());
        assert!(BoolOp::Slice.is_cutting());
        assert!(!BoolOp::Intersection.is_cutting());
    }
}
