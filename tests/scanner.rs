#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let (tokens, errors) = tokenize(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn single_and_double_character_operators() {
        assert_token_sequence(
            "({*.,+*}) != == <= >= ! = < > / -;",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::MINUS, "-"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_versus_identifiers() {
        assert_token_sequence(
            "class classy fun _under orchid or",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        assert_token_sequence(
            "// leading comment\n\tvar // trailing\n",
            &[(TokenType::VAR, "var"), (TokenType::EOF, "")],
        );
    }

    #[test]
    fn literals_render_like_tokenize_output() {
        let (tokens, _) = tokenize("12 3.5 \"hi there\" nil");
        let lines: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            lines,
            vec![
                "NUMBER 12 12.0",
                "NUMBER 3.5 3.5",
                "STRING \"hi there\" hi there",
                "NIL nil null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        assert_token_sequence(
            "123.",
            &[
                (TokenType::NUMBER(123.0), "123"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn newline_cuts_a_string_short_and_scanning_continues() {
        let (tokens, errors) = tokenize("\"a\nb\"\nx");

        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unterminated string.",
                "[line 2] Error: Unterminated string.",
            ]
        );

        let positions: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.lexeme.as_str(), t.line))
            .collect();
        assert_eq!(positions, vec![("b", 2), ("x", 3), ("", 3)]);
    }

    #[test]
    fn unexpected_characters_are_reported_and_skipped() {
        let results: Vec<_> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, error '$', LEFT_PAREN, error '#', EOF
        assert_eq!(results.len(), 6);

        let messages: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        let kinds: Vec<&'static str> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|t| t.token_type.name())
            .collect();
        assert_eq!(kinds, vec!["COMMA", "DOT", "LEFT_PAREN", "EOF"]);
    }

    #[test]
    fn unterminated_string_still_ends_with_eof() {
        let (tokens, errors) = tokenize("\"never closed");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn tokens_serialise_to_json() {
        let (tokens, _) = tokenize("x");
        let json = serde_json::to_value(&tokens[0]).expect("token serialises");

        assert_eq!(json["lexeme"], "x");
        assert_eq!(json["line"], 1);
        assert_eq!(json["column"], 1);
    }
}
