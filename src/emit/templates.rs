//! Embedded runtime templates for the emitted lexer/parser pair.
//!
//! These are opaque target-language blobs; the emitter only ever performs
//! literal replacement of the `{{…}}` placeholders. The emitted files must
//! compile standalone against the C++ standard library.

/// Placeholder for the DFA transition switch body.
pub const DFA_SWITCH_CASE: &str = "{{DFA_SWITCH_CASE}}";
/// Placeholder for the accept-state dispatch.
pub const FINAL_STATE_JUDGEMENT: &str = "{{FINAL_STATE_JUDGEMENT}}";
/// Placeholder for the GOTO lookup body.
pub const GOTO_TABLE_LOGIC: &str = "{{GOTO_TABLE_LOGIC}}";
/// Placeholder for the ACTION dispatch body.
pub const ACTION_TABLE_LOGIC: &str = "{{ACTION_TABLE_LOGIC}}";

pub const LEXER_H: &str = r##"#ifndef GENERATED_LEXER_H
#define GENERATED_LEXER_H

#include <string>

// Token produced by the generated lexer.
struct Token {
    std::string type;
    std::string text;
    int line;
};

class Lexer {
public:
    explicit Lexer(const std::string& source);

    // Returns the next non-SKIP token, or the end marker "#" at EOF.
    Token nextToken();

    int getLine() const;

private:
    std::string m_source;
    size_t m_pos;
    int m_line;

    char peek() const;
    char advance();
};

#endif // GENERATED_LEXER_H
"##;

pub const LEXER_CPP: &str = r##"#include "lexer.h"

Lexer::Lexer(const std::string& source)
    : m_source(source), m_pos(0), m_line(1) {}

int Lexer::getLine() const {
    return m_line;
}

char Lexer::peek() const {
    if (m_pos >= m_source.length()) return '\0';
    return m_source[m_pos];
}

char Lexer::advance() {
    if (m_pos >= m_source.length()) return '\0';
    char c = m_source[m_pos];
    m_pos++;
    if (c == '\n') m_line++;
    return c;
}

// DFA transition function (generated).
static int dfaStep(int state, char c) {
    int nextState = -1;
    switch (state) {
{{DFA_SWITCH_CASE}}
        default:
            break;
    }
    return nextState;
}

// Accepting-state dispatch (generated).
static const char* acceptName(int state) {
{{FINAL_STATE_JUDGEMENT}}
    return 0;
}

Token Lexer::nextToken() {
    for (;;) {
        if (m_pos >= m_source.length()) {
            return Token{"#", "", m_line};
        }

        int state = 0;
        std::string text;
        int tokenLine = m_line;

        size_t startPos = m_pos;
        int startLine = m_line;

        // longest accepting prefix seen so far
        const char* lastName = 0;
        size_t lastPos = 0;
        int lastLine = 0;
        size_t lastLen = 0;

        // greedy: run the DFA as long as a transition exists
        while (m_pos < m_source.length()) {
            int next = dfaStep(state, peek());
            if (next == -1) break;
            text += advance();
            state = next;
            const char* name = acceptName(state);
            if (name != 0) {
                lastName = name;
                lastPos = m_pos;
                lastLine = m_line;
                lastLen = text.length();
            }
        }

        if (lastName == 0) {
            // no accepting prefix: emit one character so we always advance
            m_pos = startPos;
            m_line = startLine;
            return Token{"ERROR", std::string(1, advance()), tokenLine};
        }

        // roll back to the end of the longest accepting prefix
        m_pos = lastPos;
        m_line = lastLine;
        text.resize(lastLen);

        if (std::string(lastName) == "SKIP") {
            continue;
        }
        return Token{lastName, text, tokenLine};
    }
}
"##;

pub const PARSER_H: &str = r#"#ifndef GENERATED_PARSER_H
#define GENERATED_PARSER_H

#include <string>
#include <vector>
#include "lexer.h"

// Attribute record pushed on the value stack; semantic actions read and
// write these fields.
struct SemanticValue {
    std::string text;
    int line;
    std::string code;
    std::string var;
    std::vector<int> trueList;
    std::vector<int> falseList;
    std::vector<int> nextList;
    int quad;
    int val;

    SemanticValue() : line(0), quad(0), val(0) {}
};

class Parser {
public:
    explicit Parser(Lexer& lexer);

    // Runs the shift/reduce loop; true on accept.
    bool parse();

private:
    Lexer& m_lexer;
    std::vector<int> m_states;
    std::vector<SemanticValue> m_values;
    int m_tempCounter;
    int m_labelCounter;

    std::string newTemp();
    std::string newLabel();

    static int gotoState(int state, const std::string& lhs);
};

#endif // GENERATED_PARSER_H
"#;

pub const PARSER_CPP: &str = r#"#include "parser.h"

#include <iostream>

Parser::Parser(Lexer& lexer)
    : m_lexer(lexer), m_tempCounter(0), m_labelCounter(0) {}

std::string Parser::newTemp() {
    return "t" + std::to_string(m_tempCounter++);
}

std::string Parser::newLabel() {
    return "L" + std::to_string(m_labelCounter++);
}

// GOTO table (generated).
int Parser::gotoState(int state, const std::string& lhs) {
{{GOTO_TABLE_LOGIC}}
    return -1;
}

bool Parser::parse() {
    m_states.clear();
    m_values.clear();
    m_states.push_back(0);
    m_tempCounter = 0;
    m_labelCounter = 0;

    Token tok = m_lexer.nextToken();

    for (;;) {
        int state = m_states.back();

        // ACTION table (generated).
{{ACTION_TABLE_LOGIC}}

        std::cerr << "syntax error at line " << tok.line
                  << ": unexpected " << tok.type;
        if (!tok.text.empty()) {
            std::cerr << " '" << tok.text << "'";
        }
        std::cerr << std::endl;
        return false;
    }
}
"#;
