//! Input validation tests

use ollamakit::utils::error::ErrorKind;
use ollamakit::utils::validation::*;

#[test]
fn test_question_rejections() {
    let test_cases = vec!["", "   ", "\n\t", "ab", "  a  "];

    for question in test_cases {
        let error = validate_question(question).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation, "{:?}", question);
    }
}

#[test]
fn test_question_length_bounds() {
    assert!(validate_question("abc").is_ok());
    assert!(validate_question(&"q".repeat(MAX_QUESTION_CHARS)).is_ok());

    let error = validate_question(&"q".repeat(MAX_QUESTION_CHARS + 1)).unwrap_err();
    assert_eq!(error.details["length"], (MAX_QUESTION_CHARS + 1).to_string());
}

#[test]
fn test_model_rejections() {
    assert!(validate_model("").is_err());
    assert!(validate_model("   ").is_err());
    assert!(validate_model("llama2:7b; rm -rf /").is_err());
    assert!(validate_model("`whoami`").is_err());
    assert!(validate_model("<script>").is_err());
}

#[test]
fn test_model_accepts_ollama_tags() {
    for model in ["llama2:7b", "codellama:7b-code-q4_K_M", "library/mistral:latest", "smollm2:135m"] {
        assert!(validate_model(model).is_ok(), "{} should be valid", model);
    }
}

#[test]
fn test_path_rules() {
    assert!(validate_file_path("").is_ok());
    assert!(validate_file_path("src").is_ok());
    assert!(validate_file_path("Cargo.toml").is_ok());
    assert!(validate_file_path("./src").is_ok());

    assert!(validate_file_path("../secrets").is_err());
    assert!(validate_file_path("/etc/passwd").is_err());
    assert!(validate_file_path("does/not/exist").is_err());
}

#[test]
fn test_dotted_names_are_not_traversal() {
    // `..` only counts as a whole path segment; these fail on existence instead
    for path in ["..notes", "src/..hidden", "a..b"] {
        let error = validate_file_path(path).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.starts_with("Path does not exist"), "{}: {}", path, error.message);
        assert_eq!(error.details["path"], path);
    }
}
