use crate::domain::lead::{LeadDraft, LeadField};
use crate::i18n::MessageKey;

use super::states::{SellEffect, SellEvent, SellSession, SellStep};

/// Applies one event to a questionnaire session.
///
/// Pure and total: every `(session, event)` pair produces a next session plus
/// an ordered effect list, never an error. Unexpected input degrades to a
/// no-op rather than a failure.
pub fn transition(session: SellSession, event: SellEvent) -> (SellSession, Vec<SellEffect>) {
    match event {
        SellEvent::Start => restart(session.lang),
        SellEvent::Cancel => (
            SellSession::idle(session.lang),
            vec![SellEffect::Say(MessageKey::MenuTitle)],
        ),
        SellEvent::Reply(text) => reply(session, &text),
    }
}

fn restart(lang: crate::i18n::Lang) -> (SellSession, Vec<SellEffect>) {
    (
        SellSession { lang, step: SellStep::Brand, fields: Vec::new() },
        vec![SellEffect::Say(MessageKey::SellIntro), SellEffect::Say(MessageKey::AskBrand)],
    )
}

fn reply(session: SellSession, text: &str) -> (SellSession, Vec<SellEffect>) {
    let answer = text.trim();
    if !session.is_active() || answer.is_empty() {
        return (session, Vec::new());
    }

    if session.step == SellStep::Phone {
        return phone_reply(session, answer);
    }

    let Some(field) = session.step.field() else {
        return (session, Vec::new());
    };

    let next = session.step.next();
    let mut fields = session.fields;
    fields.push((field, answer.to_string()));

    let effects = match next.prompt() {
        Some(prompt) => vec![SellEffect::Say(prompt)],
        None => Vec::new(),
    };
    (SellSession { lang: session.lang, step: next, fields }, effects)
}

fn phone_reply(session: SellSession, phone: &str) -> (SellSession, Vec<SellEffect>) {
    if !is_plausible_phone(phone) {
        return (session, vec![SellEffect::Say(MessageKey::InvalidPhone)]);
    }

    match draft_from(&session, phone) {
        Some(draft) => (
            SellSession::idle(session.lang),
            vec![SellEffect::CompleteLead(draft), SellEffect::Say(MessageKey::SellDone)],
        ),
        // A session at Phone with answers missing was truncated or tampered
        // with; restart the questionnaire rather than saving a partial lead.
        None => restart(session.lang),
    }
}

fn draft_from(session: &SellSession, phone: &str) -> Option<LeadDraft> {
    Some(LeadDraft {
        lang: session.lang,
        full_name: session.answer(LeadField::Name)?.to_string(),
        phone: phone.to_string(),
        brand_text: session.answer(LeadField::Brand)?.to_string(),
        model_text: session.answer(LeadField::Model)?.to_string(),
        year: session.answer(LeadField::Year)?.to_string(),
        color: session.answer(LeadField::Color)?.to_string(),
        price_wanted: session.answer(LeadField::Price)?.to_string(),
        condition: session.answer(LeadField::Condition)?.to_string(),
    })
}

/// Phone shape check: optional leading `+`, one digit, then at least seven
/// more characters drawn from digits, spaces, hyphens, and parentheses.
pub fn is_plausible_phone(raw: &str) -> bool {
    let trimmed = raw.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut chars = rest.chars();
    let leads_with_digit = matches!(chars.next(), Some(first) if first.is_ascii_digit());
    if !leads_with_digit {
        return false;
    }

    let mut tail_len = 0usize;
    for ch in chars {
        if !(ch.is_ascii_digit() || matches!(ch, ' ' | '-' | '(' | ')')) {
            return false;
        }
        tail_len += 1;
    }
    tail_len >= 7
}
