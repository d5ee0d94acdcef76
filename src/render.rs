//! Terminal output of tokenized documents
//!
//! Colored rendering uses crossterm styling commands; the token dump
//! reports display columns so wide characters line up with what a
//! terminal shows.

use std::collections::HashMap;
use std::io::Write;

use crossterm::queue;
use crossterm::style::{self, Attribute, Print, ResetColor, SetAttribute, SetForegroundColor};
use unicode_width::UnicodeWidthStr;

use crate::error::Result;
use crate::syntax::{Color, LineTokens, Style, TokenType};

/// Styles per token type
#[derive(Debug, Clone, Default)]
pub struct Theme {
    overrides: HashMap<TokenType, Style>,
}

impl Theme {
    /// Default styles with the given foreground colors replaced
    pub fn with_colors(colors: &[(TokenType, Color)]) -> Self {
        let overrides = colors
            .iter()
            .map(|&(token, color)| (token, token.default_style().with_fg(color)))
            .collect();
        Self { overrides }
    }

    pub fn style(&self, token: TokenType) -> Style {
        self.overrides
            .get(&token)
            .copied()
            .unwrap_or_else(|| token.default_style())
    }
}

fn to_crossterm(color: Color) -> style::Color {
    match color {
        Color::Default => style::Color::Reset,
        Color::Black => style::Color::Black,
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Yellow => style::Color::DarkYellow,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::White => style::Color::Grey,
        Color::BrightBlack => style::Color::DarkGrey,
        Color::BrightRed => style::Color::Red,
        Color::BrightGreen => style::Color::Green,
        Color::BrightYellow => style::Color::Yellow,
        Color::BrightBlue => style::Color::Blue,
        Color::BrightMagenta => style::Color::Magenta,
        Color::BrightCyan => style::Color::Cyan,
        Color::BrightWhite => style::Color::White,
    }
}

/// Write one line with its token styles applied
pub fn render_line<W: Write>(out: &mut W, text: &str, line: &LineTokens, theme: &Theme) -> Result<()> {
    for token in &line.tokens {
        let style = theme.style(token.kind);
        let slice = token.text(text);
        if style.is_default() {
            queue!(out, Print(slice))?;
            continue;
        }

        if style.fg != Color::Default {
            queue!(out, SetForegroundColor(to_crossterm(style.fg)))?;
        }
        if style.bold {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(out, Print(slice), SetAttribute(Attribute::Reset), ResetColor)?;
    }
    queue!(out, Print("\n"))?;
    Ok(())
}

/// Write a whole document, colored or plain
pub fn render_document<W: Write>(out: &mut W, text: &str, lines: &[LineTokens], theme: &Theme, color: bool) -> Result<()> {
    for (source, line) in text.lines().zip(lines) {
        if color {
            render_line(out, source, line, theme)?;
        } else {
            writeln!(out, "{}", source)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write `line:col-col scope grammar text` for every classified token
///
/// Lines and columns are 1-based; columns count display cells.
pub fn dump_tokens<W: Write>(out: &mut W, text: &str, lines: &[LineTokens]) -> Result<()> {
    for (idx, (source, line)) in text.lines().zip(lines).enumerate() {
        for token in line.tokens.iter().filter(|t| t.kind != TokenType::Default) {
            let start_col = source.get(..token.start).map(|s| s.width()).unwrap_or(0) + 1;
            let end_col = start_col + token.text(source).width();
            writeln!(
                out,
                "{}:{}-{} {} {} {:?}",
                idx + 1,
                start_col,
                end_col,
                token.kind.scope(),
                line.grammar,
                token.text(source)
            )?;
        }
    }
    out.flush()?;
    Ok(())
}
