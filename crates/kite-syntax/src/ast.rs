//! Abstract syntax tree.
//!
//! Types and values share one expression tree: `[]int`, `map[K]V` and
//! `*T` are expressions like any other, and the checker decides from
//! context whether an expression denotes a type or a value.
//!
//! Every [`Expr`] and [`Ident`] carries an id that is unique across all
//! files parsed with the same [`IdGen`]; the checker records its results
//! against these ids.

use kite_common::span::Span;
use kite_common::symbol::Symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentId(pub u32);

/// Hands out node ids. Share one generator across every file of a project.
#[derive(Debug, Default)]
pub struct IdGen {
    next_expr: u32,
    next_ident: u32,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&mut self) -> ExprId {
        let id = ExprId(self.next_expr);
        self.next_expr += 1;
        id
    }

    pub fn ident(&mut self) -> IdentId {
        let id = IdentId(self.next_ident);
        self.next_ident += 1;
        id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ident {
    pub id: IdentId,
    pub symbol: Symbol,
    pub span: Span,
}

// =============================================================================
// Files and declarations
// =============================================================================

#[derive(Debug, Clone)]
pub struct File {
    pub package: Option<Ident>,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `import name "path"`
#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    /// The decoded import path.
    pub path: String,
    pub path_span: Span,
    pub span: Span,
}

/// Package-level declaration. Grouped declarations are flattened into one
/// entry per spec.
#[derive(Debug, Clone)]
pub enum Decl {
    Const(ValueSpec),
    Var(ValueSpec),
    Type(TypeSpec),
    Func(FuncDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Const(spec) | Decl::Var(spec) => spec.span,
            Decl::Type(spec) => spec.span,
            Decl::Func(decl) => decl.span,
        }
    }
}

/// One `const` or `var` spec.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    /// Index of the spec within its `const` group.
    pub iota: u32,
    /// Type and values were repeated from an earlier spec in the group.
    pub implicit: bool,
    pub span: Span,
}

/// `[T, U any]`
#[derive(Debug, Clone)]
pub struct TypeParamDecl {
    pub names: Vec<Ident>,
    pub constraint: Expr,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub tparams: Vec<TypeParamDecl>,
    /// `type A = B`
    pub assign: bool,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Param>,
    pub name: Ident,
    pub tparams: Vec<TypeParamDecl>,
    pub sig: FuncTypeExpr,
    /// Bodies are kept as raw spans; statements are not parsed.
    pub body: Option<Span>,
    pub span: Span,
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Placeholder for an expression that failed to parse.
    Bad,
    Ident(Ident),
    BasicLit(BasicLit),
    Paren(Box<Expr>),
    Selector(Box<SelectorExpr>),
    Call(Box<CallExpr>),
    /// `x[i]`, and `f[A, B]` for explicit instantiation.
    Index(Box<IndexExpr>),
    TypeAssert(Box<TypeAssertExpr>),
    Unary(Box<UnaryExpr>),
    /// `*x`: indirection or a pointer type.
    Star(Box<Expr>),
    /// `[N]T`, or `[]T` when `len` is absent.
    ArrayType(Box<ArrayTypeExpr>),
    MapType(Box<MapTypeExpr>),
    FuncType(Box<FuncTypeExpr>),
    StructType(Box<StructTypeExpr>),
    InterfaceType(Box<InterfaceTypeExpr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Rune,
    String,
}

/// A literal kept as its source text; decoding happens during checking.
#[derive(Debug, Clone)]
pub struct BasicLit {
    pub kind: LitKind,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct SelectorExpr {
    pub expr: Expr,
    pub sel: Ident,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub func: Expr,
    pub args: Vec<Expr>,
    /// The last argument is followed by `...`.
    pub spread: bool,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub expr: Expr,
    pub indices: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct TypeAssertExpr {
    pub expr: Expr,
    pub ty: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Pos,
    /// `!`
    Not,
    /// `&`
    Addr,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "!",
            UnaryOp::Addr => "&",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
}

#[derive(Debug, Clone)]
pub struct ArrayTypeExpr {
    pub len: Option<Expr>,
    pub elem: Expr,
}

#[derive(Debug, Clone)]
pub struct MapTypeExpr {
    pub key: Expr,
    pub value: Expr,
}

/// A parameter or result entry. Unnamed entries have no `name`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: Expr,
    /// `...T`
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct FuncTypeExpr {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StructTypeExpr {
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method { name: Ident, sig: FuncTypeExpr, span: Span },
    Embedded(Expr),
}

#[derive(Debug, Clone)]
pub struct InterfaceTypeExpr {
    pub elems: Vec<InterfaceElem>,
}

impl Expr {
    /// Strips any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut e = self;
        while let ExprKind::Paren(inner) = &e.kind {
            e = inner;
        }
        e
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_gen_is_monotonic() {
        let mut ids = IdGen::new();
        assert_eq!(ids.expr(), ExprId(0));
        assert_eq!(ids.expr(), ExprId(1));
        assert_eq!(ids.ident(), IdentId(0));
    }

    #[test]
    fn test_unparen() {
        let mut ids = IdGen::new();
        let inner = Expr {
            id: ids.expr(),
            kind: ExprKind::BasicLit(BasicLit { kind: LitKind::Int, raw: "1".into() }),
            span: Span::from_u32(2, 3),
        };
        let outer = Expr {
            id: ids.expr(),
            kind: ExprKind::Paren(Box::new(Expr {
                id: ids.expr(),
                kind: ExprKind::Paren(Box::new(inner)),
                span: Span::from_u32(1, 4),
            })),
            span: Span::from_u32(0, 5),
        };
        assert!(matches!(outer.unparen().kind, ExprKind::BasicLit(_)));
    }
}
