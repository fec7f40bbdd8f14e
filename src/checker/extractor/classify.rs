use super::super::syntax::{Cursor, CursorKind, NodeHash};

/// Constructs the checker cannot analyze; pruned with a once-per-kind warning.
pub(super) fn is_unsupported(kind: &CursorKind) -> bool {
    matches!(
        kind,
        CursorKind::ClassTemplate
            | CursorKind::ConversionFunction
            | CursorKind::CxxMethod
            | CursorKind::FunctionTemplate
            | CursorKind::StmtExpr
    )
}

/// Constructs with no bearing on the call graph; pruned silently.
pub(super) fn is_skipped(kind: &CursorKind) -> bool {
    matches!(
        kind,
        CursorKind::AlignedAttr
            | CursorKind::AsmLabelAttr
            | CursorKind::ClassTemplatePartialSpecialization
            | CursorKind::Constructor
            | CursorKind::ConstAttr
            | CursorKind::DefaultStmt
            | CursorKind::Destructor
            | CursorKind::EnumConstantDecl
            | CursorKind::EnumDecl
            | CursorKind::FloatingLiteral
            | CursorKind::IntegerLiteral
            | CursorKind::NullStmt
            | CursorKind::PureAttr
            | CursorKind::SizeOfPackExpr
            | CursorKind::StringLiteral
            | CursorKind::TemplateTypeParameter
            | CursorKind::TemplateNonTypeParameter
            | CursorKind::TypedefDecl
            | CursorKind::TypeAliasDecl
            | CursorKind::TypeAliasTemplateDecl
            | CursorKind::UnexposedAttr
            | CursorKind::UnionDecl
            | CursorKind::UsingDirective
            | CursorKind::VisibilityAttr
            | CursorKind::WarnUnusedResultAttr
    )
}

pub(super) fn is_scope(kind: &CursorKind) -> bool {
    matches!(kind, CursorKind::CompoundStmt)
}

pub(super) fn is_var_decl(kind: &CursorKind) -> bool {
    matches!(kind, CursorKind::VarDecl)
}

/// The only child of `node`, provided it has exactly one and it is `kind`.
pub(super) fn only_child_of<C: Cursor>(node: &C, kind: CursorKind) -> Option<C> {
    let mut children = node.children();
    if children.len() != 1 {
        return None;
    }
    let child = children.remove(0);
    if child.kind() == kind {
        Some(child)
    } else {
        None
    }
}

/// Unwrap `node` to the lambda expression it wraps, if any. Parsers older
/// than clang-16 materialize a lambda bound through std::function as an
/// unexposed expression around a converting call.
pub(super) fn as_lambda<C: Cursor>(node: &C) -> Option<C> {
    match node.kind() {
        CursorKind::LambdaExpr => Some(node.clone()),
        CursorKind::UnexposedExpr => {
            let call = only_child_of(node, CursorKind::CallExpr)?;
            let inner = only_child_of(&call, CursorKind::UnexposedExpr)?;
            only_child_of(&inner, CursorKind::LambdaExpr)
        }
        _ => None,
    }
}

/// Determine if `node` is a function declaration, returning its name and
/// the identity later call sites resolve against (the definition's when the
/// parser has bound one).
pub(super) fn as_fn_decl<C: Cursor>(node: &C) -> Option<(String, NodeHash)> {
    match node.kind() {
        CursorKind::FunctionDecl | CursorKind::FunctionTemplate => {
            let identity = node.definition_hash().unwrap_or_else(|| node.hash());
            Some((node.spelling(), identity))
        }
        _ => None,
    }
}

/// Matches a top level `lhs = rhs` assignment. The operator spelling is
/// recovered from the token stream: the token immediately after the left
/// operand's tokens is the operator itself.
pub(super) fn as_assignment<C: Cursor>(node: &C) -> Option<(C, C)> {
    if node.kind() != CursorKind::BinaryOperator {
        return None;
    }
    let mut children = node.children();
    if children.len() != 2 {
        return None;
    }
    let rhs = children.pop()?;
    let lhs = children.pop()?;

    let operator_offset = lhs.tokens().len();
    let tokens = node.tokens();
    if tokens.get(operator_offset).map(String::as_str) == Some("=") {
        Some((lhs, rhs))
    } else {
        None
    }
}

/// Determine if `node` is a function call, returning the callee's name and
/// identity. Invocations through `operator()` name the invocable in an
/// unexposed child instead of the call node itself.
pub(super) fn as_call<C: Cursor>(node: &C) -> Option<(String, NodeHash)> {
    if node.kind() != CursorKind::CallExpr {
        return None;
    }
    let spelling = node.spelling();
    if spelling != "operator()" {
        let identity = node.referenced_hash().unwrap_or_else(|| node.hash());
        return Some((spelling, identity));
    }

    for child in node.children() {
        if child.kind() == CursorKind::UnexposedExpr {
            if child.spelling() == "operator()" {
                continue;
            }
            let identity = child.referenced_hash().unwrap_or_else(|| child.hash());
            return Some((child.spelling(), identity));
        }
    }
    None
}
