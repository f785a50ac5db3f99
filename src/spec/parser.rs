//! Production parser for the grammar section's token stream.

use chumsky::prelude::*;

use super::lexer::Tok;

/// A production as written in the file, before ids are assigned and the ε
/// sentinel is stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProduction {
    pub lhs: String,
    pub rhs: Vec<String>,
    pub action: String,
}

pub fn parser<'a>(
) -> impl Parser<'a, &'a [Tok], Vec<RawProduction>, extra::Err<Rich<'a, Tok>>> {
    let ident = select! {
        Tok::Ident(name) => name,
    }
    .labelled("symbol");

    let action = select! {
        Tok::Action(body) => body,
    }
    .labelled("action");

    let colon = just(Tok::Colon).labelled("`:`");
    let lf = just(Tok::LineFeed);

    let production = ident
        .clone()
        .then_ignore(colon)
        .then(ident.repeated().collect::<Vec<_>>())
        .then(action.or_not())
        .then_ignore(lf.clone())
        .map(|((lhs, rhs), action)| RawProduction {
            lhs,
            rhs,
            action: action.unwrap_or_default(),
        })
        .map(Some);

    let empty_line = lf.to(None::<RawProduction>);

    production
        .or(empty_line)
        .repeated()
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect())
}
