use std::fmt;

use strum_macros::EnumString;

/// Kinds of syntax tree nodes as reported by the external C++ parser.
///
/// The names mirror the parser's dump format. Only the kinds the extractor
/// classifies are enumerated; everything else lands in `Other` and flows
/// through the default descend path of the walker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum CursorKind {
    #[strum(serialize = "TRANSLATION_UNIT")]
    TranslationUnit,

    // Function shaped nodes
    #[strum(serialize = "FUNCTION_DECL")]
    FunctionDecl,
    #[strum(serialize = "FUNCTION_TEMPLATE")]
    FunctionTemplate,
    #[strum(serialize = "LAMBDA_EXPR")]
    LambdaExpr,
    #[strum(serialize = "PARM_DECL")]
    ParmDecl,

    // Expression and statement nodes the walker inspects
    #[strum(serialize = "UNEXPOSED_EXPR")]
    UnexposedExpr,
    #[strum(serialize = "CALL_EXPR")]
    CallExpr,
    #[strum(serialize = "COMPOUND_STMT")]
    CompoundStmt,
    #[strum(serialize = "VAR_DECL")]
    VarDecl,
    #[strum(serialize = "BINARY_OPERATOR")]
    BinaryOperator,
    #[strum(serialize = "ANNOTATE_ATTR")]
    AnnotateAttr,
    #[strum(serialize = "DECL_REF_EXPR")]
    DeclRefExpr,

    // Unsupported constructs, pruned with a once-per-kind warning
    #[strum(serialize = "CLASS_TEMPLATE")]
    ClassTemplate,
    #[strum(serialize = "CONVERSION_FUNCTION")]
    ConversionFunction,
    #[strum(serialize = "CXX_METHOD")]
    CxxMethod,
    #[strum(serialize = "STMT_EXPR")]
    StmtExpr,

    // Silently skipped kinds
    #[strum(serialize = "ALIGNED_ATTR")]
    AlignedAttr,
    #[strum(serialize = "ASM_LABEL_ATTR")]
    AsmLabelAttr,
    #[strum(serialize = "CLASS_TEMPLATE_PARTIAL_SPECIALIZATION")]
    ClassTemplatePartialSpecialization,
    #[strum(serialize = "CONSTRUCTOR")]
    Constructor,
    #[strum(serialize = "CONST_ATTR")]
    ConstAttr,
    #[strum(serialize = "DEFAULT_STMT")]
    DefaultStmt,
    #[strum(serialize = "DESTRUCTOR")]
    Destructor,
    #[strum(serialize = "ENUM_CONSTANT_DECL")]
    EnumConstantDecl,
    #[strum(serialize = "ENUM_DECL")]
    EnumDecl,
    #[strum(serialize = "FLOATING_LITERAL")]
    FloatingLiteral,
    #[strum(serialize = "INTEGER_LITERAL")]
    IntegerLiteral,
    #[strum(serialize = "NULL_STMT")]
    NullStmt,
    #[strum(serialize = "PURE_ATTR")]
    PureAttr,
    #[strum(serialize = "SIZE_OF_PACK_EXPR")]
    SizeOfPackExpr,
    #[strum(serialize = "STRING_LITERAL")]
    StringLiteral,
    #[strum(serialize = "TEMPLATE_TYPE_PARAMETER")]
    TemplateTypeParameter,
    #[strum(serialize = "TEMPLATE_NON_TYPE_PARAMETER")]
    TemplateNonTypeParameter,
    #[strum(serialize = "TYPEDEF_DECL")]
    TypedefDecl,
    #[strum(serialize = "TYPE_ALIAS_DECL")]
    TypeAliasDecl,
    #[strum(serialize = "TYPE_ALIAS_TEMPLATE_DECL")]
    TypeAliasTemplateDecl,
    #[strum(serialize = "UNEXPOSED_ATTR")]
    UnexposedAttr,
    #[strum(serialize = "UNION_DECL")]
    UnionDecl,
    #[strum(serialize = "USING_DIRECTIVE")]
    UsingDirective,
    #[strum(serialize = "VISIBILITY_ATTR")]
    VisibilityAttr,
    #[strum(serialize = "WARN_UNUSED_RESULT_ATTR")]
    WarnUnusedResultAttr,

    /// Any kind the checker has no special handling for.
    #[strum(default)]
    Other(String),
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CursorKind::TranslationUnit => "TRANSLATION_UNIT",
            CursorKind::FunctionDecl => "FUNCTION_DECL",
            CursorKind::FunctionTemplate => "FUNCTION_TEMPLATE",
            CursorKind::LambdaExpr => "LAMBDA_EXPR",
            CursorKind::ParmDecl => "PARM_DECL",
            CursorKind::UnexposedExpr => "UNEXPOSED_EXPR",
            CursorKind::CallExpr => "CALL_EXPR",
            CursorKind::CompoundStmt => "COMPOUND_STMT",
            CursorKind::VarDecl => "VAR_DECL",
            CursorKind::BinaryOperator => "BINARY_OPERATOR",
            CursorKind::AnnotateAttr => "ANNOTATE_ATTR",
            CursorKind::DeclRefExpr => "DECL_REF_EXPR",
            CursorKind::ClassTemplate => "CLASS_TEMPLATE",
            CursorKind::ConversionFunction => "CONVERSION_FUNCTION",
            CursorKind::CxxMethod => "CXX_METHOD",
            CursorKind::StmtExpr => "STMT_EXPR",
            CursorKind::AlignedAttr => "ALIGNED_ATTR",
            CursorKind::AsmLabelAttr => "ASM_LABEL_ATTR",
            CursorKind::ClassTemplatePartialSpecialization => {
                "CLASS_TEMPLATE_PARTIAL_SPECIALIZATION"
            }
            CursorKind::Constructor => "CONSTRUCTOR",
            CursorKind::ConstAttr => "CONST_ATTR",
            CursorKind::DefaultStmt => "DEFAULT_STMT",
            CursorKind::Destructor => "DESTRUCTOR",
            CursorKind::EnumConstantDecl => "ENUM_CONSTANT_DECL",
            CursorKind::EnumDecl => "ENUM_DECL",
            CursorKind::FloatingLiteral => "FLOATING_LITERAL",
            CursorKind::IntegerLiteral => "INTEGER_LITERAL",
            CursorKind::NullStmt => "NULL_STMT",
            CursorKind::PureAttr => "PURE_ATTR",
            CursorKind::SizeOfPackExpr => "SIZE_OF_PACK_EXPR",
            CursorKind::StringLiteral => "STRING_LITERAL",
            CursorKind::TemplateTypeParameter => "TEMPLATE_TYPE_PARAMETER",
            CursorKind::TemplateNonTypeParameter => "TEMPLATE_NON_TYPE_PARAMETER",
            CursorKind::TypedefDecl => "TYPEDEF_DECL",
            CursorKind::TypeAliasDecl => "TYPE_ALIAS_DECL",
            CursorKind::TypeAliasTemplateDecl => "TYPE_ALIAS_TEMPLATE_DECL",
            CursorKind::UnexposedAttr => "UNEXPOSED_ATTR",
            CursorKind::UnionDecl => "UNION_DECL",
            CursorKind::UsingDirective => "USING_DIRECTIVE",
            CursorKind::VisibilityAttr => "VISIBILITY_ATTR",
            CursorKind::WarnUnusedResultAttr => "WARN_UNUSED_RESULT_ATTR",
            CursorKind::Other(raw) => return write!(f, "{raw}"),
        };
        write!(f, "{s}")
    }
}
