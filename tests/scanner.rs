#[cfg(test)]
mod scanner_tests {
    use rlox_tw as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len(), "tokens: {:?}", tokens);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
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
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn simple_sum_has_literals_and_line_one() {
        let (tokens, errors) = scan_tokens("1 + 2");

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 4);

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 1.0));
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].token_type, TokenType::PLUS);
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 2.0));
        assert_eq!(tokens[3].token_type, TokenType::EOF);

        assert!(tokens.iter().all(|t| t.line == 1));
    }

    #[test]
    fn comment_only_yields_eof() {
        let (tokens, errors) = scan_tokens("// comment");

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn two_character_operators_use_longest_match() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_take_priority_over_identifiers() {
        assert_token_sequence(
            "and class orchid _private fun for2 this",
            &[
                (TokenType::AND, "and"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::IDENTIFIER, "_private"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "for2"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        assert_token_sequence(
            "123. 4.5",
            &[
                (TokenType::NUMBER(0.0), "123"),
                (TokenType::DOT, "."),
                (TokenType::NUMBER(0.0), "4.5"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn multi_line_string_advances_line_counter() {
        let (tokens, errors) = scan_tokens("\"one\ntwo\"\nx");

        assert!(errors.is_empty());
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "one\ntwo"),
            other => panic!("expected string, got {:?}", other),
        }
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (tokens, errors) = scan_tokens("print \"oops");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<Result<Token, LoxError>> = Scanner::new(source).collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character.".to_string(),
                "[line 1] Error: Unexpected character.".to_string(),
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn multi_byte_character_is_reported_once() {
        let (tokens, errors) = scan_tokens("é;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unexpected character.");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::SEMICOLON);
    }

    #[test]
    fn token_display_matches_dump_format() {
        let (tokens, _) = scan_tokens("var x = 42; \"hi\" 1.5");
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 42 42.0",
                "SEMICOLON ; null",
                "STRING \"hi\" hi",
                "NUMBER 1.5 1.5",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn scanner_is_fused_after_eof() {
        let mut scanner = Scanner::new("");

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn tokens_serialize_to_json() {
        let (tokens, _) = scan_tokens("x");
        let json = serde_json::to_value(&tokens).expect("tokens serialize");

        assert_eq!(json[0]["lexeme"], "x");
        assert_eq!(json[0]["token_type"], "IDENTIFIER");
        assert_eq!(json[0]["line"], 1);
        assert_eq!(json[1]["token_type"], "EOF");
    }
}
