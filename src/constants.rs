pub const TITLE_MAX_LENGTH: usize = 255;
pub const NAME_MAX_LENGTH: usize = 255;
pub const LINK_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const PASSWORD_MIN_LENGTH: usize = 5;

pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Largest accepted JSON request body.
pub const JSON_BODY_LIMIT: u64 = 64 * 1024;

pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";
pub const IMAGE_FIELD: &str = "image";

pub const FLAG_VALUES: &[(&str, bool)] = &[
    ("true", true),
    ("t", true),
    ("yes", true),
    ("y", true),
    ("on", true),
    ("false", false),
    ("f", false),
    ("no", false),
    ("n", false),
    ("off", false),
    ("", false),
];

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NOT_A_STRING: &str = "Not a valid string.";
pub const MSG_INVALID_INTEGER: &str = "A valid integer is required.";
pub const MSG_INVALID_NUMBER: &str = "A valid number is required.";
pub const MSG_NOT_NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";
pub const MSG_INVALID_BOOLEAN: &str = "Must be a valid boolean.";
pub const MSG_INVALID_ID_LIST: &str = "Enter a comma-separated list of ids.";
pub const MSG_NO_FILE: &str = "No file was submitted.";
pub const MSG_EMPTY_FILE: &str = "The submitted file is empty.";
pub const MSG_INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const MSG_BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";
pub const MSG_NO_CREDENTIALS: &str = "Authentication credentials were not provided.";
pub const MSG_INVALID_TOKEN: &str = "Invalid token.";
