// document constants
pub const DOC_ID: &str = "_id";
pub const OPERATOR_PREFIX: &str = "$";
pub const FIELD_SEPARATOR: char = '.';

// query operators
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_NE: &str = "$ne";
pub const OP_LIKE: &str = "$like";
pub const OP_ILIKE: &str = "$ilike";
pub const OP_REGEX: &str = "$regex";
pub const OP_HAS: &str = "$has";
pub const OP_CONTAINS: &str = "$contains";
pub const OP_IN: &str = "$in";
pub const OP_NIN: &str = "$nin";
pub const OP_OR: &str = "$or";
pub const OP_AND: &str = "$and";
pub const OP_NOT: &str = "$not";

// update modifiers
pub const MOD_INC: &str = "$inc";
pub const MOD_PUSH: &str = "$push";
pub const MOD_SET: &str = "$set";
pub const MOD_UNSET: &str = "$unset";

// store constants
pub const DEFAULT_DB_NAME: &str = "quill";
pub const DB_FILE_EXTENSION: &str = "db";
pub const TEMP_FILE_SUFFIX: &str = "tmp";
pub const DEFAULT_ID_LENGTH: usize = 16;
pub const MAX_ID_ATTEMPTS: usize = 32;
