//! Error kinds and their numeric codes

use thiserror::Error;

/// Every failure the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // ==================
    // Lexical
    // ==================
    /// Byte not allowed at this point of the grammar
    #[error("Invalid character {0:?} {1}")]
    InvalidCharacter(char, &'static str),

    /// Input ended inside a value or annotation
    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// Inline annotation rules were not closed on their line
    #[error("Unexpected end of line in inline annotation")]
    UnexpectedEndOfLine,

    /// Input holds no value at all
    #[error("Empty input")]
    EmptyInput,

    /// Source file could not be read
    #[error("Cannot read {0}")]
    ReadFile(String),

    // ==================
    // Loader
    // ==================
    /// Lexical event arrived in a state that does not expect it
    #[error("Loader error: unexpected lexeme {0}")]
    Loader(String),

    /// Rule value has the wrong shape
    #[error("Incorrect value type of the \"{0}\" rule")]
    IncorrectRuleValueType(String),

    /// Annotation on a line where no node starts
    #[error("Annotation is not attached to any example value")]
    IncorrectRuleWithoutExample,

    /// Annotation on a line where several nodes start
    #[error("Annotation is ambiguous: several values start on this line")]
    IncorrectRuleForSeveralNode,

    /// Object key declared twice in a schema
    #[error("Duplicate key \"{0}\" in schema")]
    DuplicateKeysInSchema(String),

    /// Rule declared twice for one node
    #[error("Duplicate rule \"{0}\"")]
    DuplicateRule(String),

    /// Type name registered twice
    #[error("Duplicate type name \"{0}\"")]
    DuplicationOfNameOfTypes(String),

    /// Rule name is not known
    #[error("Unknown rule \"{0}\"")]
    UnknownRule(String),

    /// Type name does not follow the `@name` syntax
    #[error("Invalid type name \"{0}\"")]
    InvalidTypeName(String),

    /// `type` rule names an unknown built-in type
    #[error("Unknown schema type \"{0}\"")]
    UnknownSchemaType(String),

    /// `or`, `enum` or `allOf` array is empty
    #[error("Empty array in the \"{0}\" rule")]
    EmptyArrayInRule(String),

    /// `or` rule set does not say which type it describes
    #[error("The \"type\" rule is required for an \"or\" item")]
    OrItemWithoutType,

    /// `enum` lists the same value twice
    #[error("Duplicate value {0} in the \"enum\" rule")]
    DuplicationInEnumRule(String),

    /// Rule needs an example value but the node has none
    #[error("The \"{0}\" rule requires an example value")]
    RuleRequiresExample(String),

    // ==================
    // Rule values
    // ==================
    /// Rule value is out of range
    #[error("Invalid value of the \"{0}\" rule")]
    InvalidValueOfConstraint(String),

    /// `precision: 0`
    #[error("Precision can not be zero")]
    ZeroPrecision,

    /// `regex` does not compile
    #[error("Invalid regular expression: {0}")]
    InvalidRegex(String),

    // ==================
    // Schema consistency
    // ==================
    /// Rule incompatible with the node type
    #[error("The \"{0}\" rule is not compatible with the \"{1}\" type")]
    UnexpectedConstraint(String, String),

    #[error("There should be no other rules in the set with the \"enum\" rule")]
    ShouldBeNoOtherRulesInSetWithEnum,

    #[error("There should be no other rules in the set with the \"or\" rule")]
    ShouldBeNoOtherRulesInSetWithOr,

    #[error("There should be no other rules in the set with the \"any\" type")]
    ShouldBeNoOtherRulesInSetWithAny,

    #[error("Other rules can not be specified together with a type reference")]
    CannotSpecifyOtherRulesWithTypeReference,

    /// Example holds children although its shape comes from elsewhere
    #[error("Invalid child node together with {0}")]
    InvalidChildNodeTogetherWithTypeReference(&'static str),

    #[error("The \"min\" rule is required by \"exclusiveMinimum\"")]
    ConstraintMinNotFound,

    #[error("The \"max\" rule is required by \"exclusiveMaximum\"")]
    ConstraintMaxNotFound,

    /// Referenced type is not registered
    #[error("Type \"{0}\" not found")]
    TypeNotFound(String),

    #[error("Impossible to determine the JSON type of \"{0}\" due to recursion")]
    ImpossibleToDetermineTheJsonTypeDueToRecursion(String),

    /// Example value does not fit the referenced type
    #[error("The example value does not match the type \"{0}\"")]
    IncorrectUserType(String),

    /// No alternative of an `or` set accepted the value
    #[error("The value does not match any rule set of the \"or\" rule")]
    OrRuleSetValidation,

    #[error("The \"or\" rule is required for the \"mixed\" type")]
    MixedTypeRequiresOr,

    #[error("The \"enum\" rule is required for the \"enum\" type")]
    EnumTypeRequiresEnumRule,

    #[error("The \"precision\" rule is required for the \"decimal\" type")]
    DecimalRequiresPrecision,

    /// `min > max` and similar rule pairs
    #[error("The value of the \"{0}\" rule is greater than the value of the \"{1}\" rule")]
    ValueOfOneConstraintGreaterThanAnother(&'static str, &'static str),

    // ==================
    // Document validation
    // ==================
    /// Document value has the wrong JSON type
    #[error("Invalid value type: expected {0}, got {1}")]
    InvalidValueType(String, String),

    /// Document value breaks a rule
    #[error("The value does not satisfy the \"{0}\" rule: {1}")]
    ConstraintValidation(String, String),

    #[error("Schema does not support the key \"{0}\"")]
    SchemaDoesNotSupportKey(String),

    #[error("Required key \"{0}\" not found")]
    RequiredKeyNotFound(String),

    #[error("Duplicate key \"{0}\" in document")]
    DuplicateKeysInDocument(String),

    #[error("Unexpected array item")]
    UnexpectedArrayItem,

    #[error("Array item #{0} not found")]
    RequiredArrayItemNotFound(usize),

    #[error("The value does not match any of the \"enum\" values")]
    DoesNotMatchAnyOfTheEnumValues,

    #[error("The value does not match the regular expression")]
    DoesNotMatchRegularExpression,

    /// `email`, `uri`, `date`, `datetime`, `uuid` shape violations
    #[error("Invalid {0} value")]
    InvalidFormat(&'static str),

    #[error("The value does not match the constant {0}")]
    DoesNotMatchConst(String),

    // ==================
    // allOf
    // ==================
    /// Only object types can be merged
    #[error("Unacceptable type \"{0}\" in the \"allOf\" rule")]
    UnacceptableTypeInAllOfRule(String),

    #[error("Duplicate key \"{0}\" while merging the \"allOf\" rule")]
    DuplicateKeyInAllOf(String),

    #[error("Conflicting \"additionalProperties\" rules while merging the \"allOf\" rule")]
    ConflictAdditionalPropertiesInAllOf,

    #[error("Cycle in the \"allOf\" rule through \"{0}\"")]
    AllOfCycle(String),
}

impl ErrorKind {
    /// Returns the numeric error code.
    pub fn code(&self) -> u16 {
        match self {
            ErrorKind::InvalidCharacter(..) => 1101,
            ErrorKind::UnexpectedEof => 1102,
            ErrorKind::UnexpectedEndOfLine => 1103,
            ErrorKind::EmptyInput => 1104,
            ErrorKind::ReadFile(_) => 1105,

            ErrorKind::Loader(_) => 1201,
            ErrorKind::IncorrectRuleValueType(_) => 1202,
            ErrorKind::IncorrectRuleWithoutExample => 1203,
            ErrorKind::IncorrectRuleForSeveralNode => 1204,
            ErrorKind::DuplicateKeysInSchema(_) => 1205,
            ErrorKind::DuplicateRule(_) => 1206,
            ErrorKind::DuplicationOfNameOfTypes(_) => 1207,
            ErrorKind::UnknownRule(_) => 1208,
            ErrorKind::InvalidTypeName(_) => 1209,
            ErrorKind::UnknownSchemaType(_) => 1210,
            ErrorKind::EmptyArrayInRule(_) => 1211,
            ErrorKind::OrItemWithoutType => 1212,
            ErrorKind::DuplicationInEnumRule(_) => 1213,
            ErrorKind::RuleRequiresExample(_) => 1214,

            ErrorKind::InvalidValueOfConstraint(_) => 1301,
            ErrorKind::ZeroPrecision => 1302,
            ErrorKind::InvalidRegex(_) => 1303,

            ErrorKind::UnexpectedConstraint(..) => 1401,
            ErrorKind::ShouldBeNoOtherRulesInSetWithEnum => 1402,
            ErrorKind::ShouldBeNoOtherRulesInSetWithOr => 1403,
            ErrorKind::ShouldBeNoOtherRulesInSetWithAny => 1404,
            ErrorKind::CannotSpecifyOtherRulesWithTypeReference => 1405,
            ErrorKind::InvalidChildNodeTogetherWithTypeReference(_) => 1406,
            ErrorKind::ConstraintMinNotFound => 1407,
            ErrorKind::ConstraintMaxNotFound => 1408,
            ErrorKind::TypeNotFound(_) => 1409,
            ErrorKind::ImpossibleToDetermineTheJsonTypeDueToRecursion(_) => 1410,
            ErrorKind::IncorrectUserType(_) => 1411,
            ErrorKind::OrRuleSetValidation => 1412,
            ErrorKind::MixedTypeRequiresOr => 1413,
            ErrorKind::EnumTypeRequiresEnumRule => 1414,
            ErrorKind::DecimalRequiresPrecision => 1415,
            ErrorKind::ValueOfOneConstraintGreaterThanAnother(..) => 1416,

            ErrorKind::InvalidValueType(..) => 1501,
            ErrorKind::ConstraintValidation(..) => 1502,
            ErrorKind::SchemaDoesNotSupportKey(_) => 1503,
            ErrorKind::RequiredKeyNotFound(_) => 1504,
            ErrorKind::DuplicateKeysInDocument(_) => 1505,
            ErrorKind::UnexpectedArrayItem => 1506,
            ErrorKind::RequiredArrayItemNotFound(_) => 1507,
            ErrorKind::DoesNotMatchAnyOfTheEnumValues => 1508,
            ErrorKind::DoesNotMatchRegularExpression => 1509,
            ErrorKind::InvalidFormat(_) => 1510,
            ErrorKind::DoesNotMatchConst(_) => 1511,

            ErrorKind::UnacceptableTypeInAllOfRule(_) => 1601,
            ErrorKind::DuplicateKeyInAllOf(_) => 1602,
            ErrorKind::ConflictAdditionalPropertiesInAllOf => 1603,
            ErrorKind::AllOfCycle(_) => 1604,
        }
    }

    /// Returns true for failures detected while validating a document.
    pub fn is_document_error(&self) -> bool {
        (1500..1600).contains(&self.code()) || matches!(self, ErrorKind::OrRuleSetValidation)
    }
}
