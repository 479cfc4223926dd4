//! Expression IR.

/// Unary operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnaryOp {
    Not,
    Neg,
    Sext8,
    Sext16,
    Clz,
    Clo,
    /// Swap bytes within each halfword.
    Wsbh,
    /// Swap all four bytes of the word.
    Wsbw,
    Bitrev,
}

/// Binary operations.
///
/// Comparisons produce `1` or `0`. Shift amounts are taken modulo 32.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Nor,
    Sll,
    Srl,
    Sra,
    Rotr,
    Eq,
    Ne,
    Lt,
    Ltu,
    Le,
    Gt,
    Ge,
    Min,
    Max,
}

/// Ternary operations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TernaryOp {
    Select,
}

/// Read expressions.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReadExpr {
    Reg(u8),
    Hi,
    Lo,
    Mem {
        addr: Box<Expr>,
        width: u8,
        signed: bool,
    },
    /// Runtime branch outcome recorded by the last branch statement.
    BranchFlag,
}

/// Expression tree node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Expr {
    Imm(u32),
    Read(ReadExpr),
    Unary {
        op: UnaryOp,
        expr: Box<Self>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Ternary {
        op: TernaryOp,
        first: Box<Self>,
        second: Box<Self>,
        third: Box<Self>,
    },
}

// These are factory methods, not trait implementations
#[allow(clippy::should_implement_trait)]
impl Expr {
    /// Create an immediate expression.
    #[must_use]
    pub const fn imm(val: u32) -> Self {
        Self::Imm(val)
    }

    /// Create a register read expression. `$zero` folds to `Imm(0)`.
    #[must_use]
    pub const fn reg(idx: u8) -> Self {
        if idx == 0 {
            return Self::Imm(0);
        }
        Self::Read(ReadExpr::Reg(idx))
    }

    /// Read the HI register.
    #[must_use]
    pub const fn hi() -> Self {
        Self::Read(ReadExpr::Hi)
    }

    /// Read the LO register.
    #[must_use]
    pub const fn lo() -> Self {
        Self::Read(ReadExpr::Lo)
    }

    /// Read the runtime branch flag.
    #[must_use]
    pub const fn branch_flag() -> Self {
        Self::Read(ReadExpr::BranchFlag)
    }

    /// Create a memory read expression.
    #[must_use]
    pub fn mem(addr: Self, width: u8, signed: bool) -> Self {
        Self::Read(ReadExpr::Mem {
            addr: Box::new(addr),
            width,
            signed,
        })
    }

    /// Unsigned memory read.
    #[must_use]
    pub fn mem_u(addr: Self, width: u8) -> Self {
        Self::mem(addr, width, false)
    }

    /// Sign-extending memory read.
    #[must_use]
    pub fn mem_s(addr: Self, width: u8) -> Self {
        Self::mem(addr, width, true)
    }

    fn unary(op: UnaryOp, expr: Self) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn ternary(op: TernaryOp, first: Self, second: Self, third: Self) -> Self {
        Self::Ternary {
            op,
            first: Box::new(first),
            second: Box::new(second),
            third: Box::new(third),
        }
    }

    /// Check if expression is statically known to be zero.
    const fn is_zero(&self) -> bool {
        matches!(self, Self::Imm(0))
    }

    /// Immediate value, if this is a constant.
    #[must_use]
    pub const fn as_imm(&self) -> Option<u32> {
        match self {
            Self::Imm(v) => Some(*v),
            _ => None,
        }
    }

    pub fn add(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l.wrapping_add(*r));
        }
        if right.is_zero() {
            return left;
        }
        if left.is_zero() {
            return right;
        }
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn sub(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l.wrapping_sub(*r));
        }
        if right.is_zero() {
            return left;
        }
        if left.is_zero() {
            return Self::neg(right);
        }
        Self::binary(BinaryOp::Sub, left, right)
    }

    pub fn and(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l & r);
        }
        if left.is_zero() || right.is_zero() {
            return Self::Imm(0);
        }
        Self::binary(BinaryOp::And, left, right)
    }

    pub fn or(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l | r);
        }
        if right.is_zero() {
            return left;
        }
        if left.is_zero() {
            return right;
        }
        Self::binary(BinaryOp::Or, left, right)
    }

    pub fn xor(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l ^ r);
        }
        if right.is_zero() {
            return left;
        }
        if left.is_zero() {
            return right;
        }
        Self::binary(BinaryOp::Xor, left, right)
    }

    pub fn nor(left: Self, right: Self) -> Self {
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(!(l | r));
        }
        Self::binary(BinaryOp::Nor, left, right)
    }

    pub fn sll(left: Self, right: Self) -> Self {
        if right.is_zero() {
            return left;
        }
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l.wrapping_shl(*r));
        }
        Self::binary(BinaryOp::Sll, left, right)
    }

    pub fn srl(left: Self, right: Self) -> Self {
        if right.is_zero() {
            return left;
        }
        if let (Self::Imm(l), Self::Imm(r)) = (&left, &right) {
            return Self::Imm(l.wrapping_shr(*r));
        }
        Self::binary(BinaryOp::Srl, left, right)
    }

    pub fn sra(left: Self, right: Self) -> Self {
        if right.is_zero() {
            return left;
        }
        Self::binary(BinaryOp::Sra, left, right)
    }

    pub fn rotr(left: Self, right: Self) -> Self {
        if right.is_zero() {
            return left;
        }
        Self::binary(BinaryOp::Rotr, left, right)
    }

    pub fn eq(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn ne(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Ne, left, right)
    }

    pub fn lt(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Lt, left, right)
    }

    pub fn ltu(left: Self, right: Self) -> Self {
        // sltu(0, x) is (0 < x) which equals (x != 0)
        if left.is_zero() {
            return Self::ne(right, Self::Imm(0));
        }
        Self::binary(BinaryOp::Ltu, left, right)
    }

    pub fn le(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Le, left, right)
    }

    pub fn gt(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Gt, left, right)
    }

    pub fn ge(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Ge, left, right)
    }

    pub fn min(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Min, left, right)
    }

    pub fn max(left: Self, right: Self) -> Self {
        Self::binary(BinaryOp::Max, left, right)
    }

    /// Create a ternary select (cond ? then : else).
    pub fn select(cond: Self, then_val: Self, else_val: Self) -> Self {
        if let Self::Imm(c) = cond {
            return if c != 0 { then_val } else { else_val };
        }
        Self::ternary(TernaryOp::Select, cond, then_val, else_val)
    }

    pub fn not(val: Self) -> Self {
        if let Self::Imm(v) = val {
            return Self::Imm(!v);
        }
        Self::unary(UnaryOp::Not, val)
    }

    pub fn neg(val: Self) -> Self {
        if let Self::Imm(v) = val {
            return Self::Imm(v.wrapping_neg());
        }
        Self::unary(UnaryOp::Neg, val)
    }

    pub fn sext8(val: Self) -> Self {
        if let Self::Imm(v) = val {
            return Self::Imm(i32::from(v.to_le_bytes()[0].cast_signed()).cast_unsigned());
        }
        Self::unary(UnaryOp::Sext8, val)
    }

    pub fn sext16(val: Self) -> Self {
        if let Self::Imm(v) = val {
            let low = u16::try_from(v & 0xffff).unwrap_or(0);
            return Self::Imm(i32::from(low.cast_signed()).cast_unsigned());
        }
        Self::unary(UnaryOp::Sext16, val)
    }

    pub fn clz(val: Self) -> Self {
        Self::unary(UnaryOp::Clz, val)
    }

    pub fn clo(val: Self) -> Self {
        Self::unary(UnaryOp::Clo, val)
    }

    pub fn wsbh(val: Self) -> Self {
        Self::unary(UnaryOp::Wsbh, val)
    }

    pub fn wsbw(val: Self) -> Self {
        Self::unary(UnaryOp::Wsbw, val)
    }

    pub fn bitrev(val: Self) -> Self {
        Self::unary(UnaryOp::Bitrev, val)
    }

    /// Whether evaluating this expression reads guest memory.
    #[must_use]
    pub fn reads_memory(&self) -> bool {
        match self {
            Self::Imm(_) => false,
            Self::Read(ReadExpr::Mem { .. }) => true,
            Self::Read(_) => false,
            Self::Unary { expr, .. } => expr.reads_memory(),
            Self::Binary { left, right, .. } => left.reads_memory() || right.reads_memory(),
            Self::Ternary {
                first,
                second,
                third,
                ..
            } => first.reads_memory() || second.reads_memory() || third.reads_memory(),
        }
    }
}
