//! Risk cards and the draw deck.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The design printed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardSymbol {
    Infantry,
    Cavalry,
    Artillery,
    Wildcard,
}

/// The three named designs, in the order they are dealt onto territory cards.
pub const NAMED_SYMBOLS: [CardSymbol; 3] =
    [CardSymbol::Infantry, CardSymbol::Cavalry, CardSymbol::Artillery];

impl CardSymbol {
    /// Returns the display name of the symbol.
    pub const fn name(self) -> &'static str {
        match self {
            CardSymbol::Infantry => "Infantry",
            CardSymbol::Cavalry => "Cavalry",
            CardSymbol::Artillery => "Artillery",
            CardSymbol::Wildcard => "Wildcard",
        }
    }

    pub const fn is_wild(self) -> bool {
        matches!(self, CardSymbol::Wildcard)
    }
}

/// A single card. Wildcards carry no territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub territory_name: Option<String>,
    pub symbol: CardSymbol,
}

impl Card {
    pub fn territory(name: impl Into<String>, symbol: CardSymbol) -> Self {
        Card {
            territory_name: Some(name.into()),
            symbol,
        }
    }

    pub fn wildcard() -> Self {
        Card {
            territory_name: None,
            symbol: CardSymbol::Wildcard,
        }
    }
}

/// The draw pile. Cards are drawn from the top and traded cards go to the bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// Builds one card per territory, cycling the named symbols, plus `wildcards` wildcards.
    pub fn for_territories<'a>(names: impl IntoIterator<Item = &'a str>, wildcards: usize) -> Self {
        let mut cards: VecDeque<Card> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Card::territory(name, NAMED_SYMBOLS[i % NAMED_SYMBOLS.len()]))
            .collect();
        cards.extend(std::iter::repeat_with(Card::wildcard).take(wildcards));
        Deck { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes and returns the top card, if any.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Puts cards back at the bottom of the pile.
    pub fn return_to_bottom(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn add_wildcards(&mut self, count: usize) {
        self.cards.extend(std::iter::repeat_with(Card::wildcard).take(count));
    }

    pub fn shuffle(&mut self, rng: &mut (impl Rng + ?Sized)) {
        self.cards.make_contiguous().shuffle(rng);
    }

    pub fn wildcard_count(&self) -> usize {
        self.cards.iter().filter(|c| c.symbol.is_wild()).count()
    }
}
