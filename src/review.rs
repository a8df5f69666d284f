//! Human review queue for drafted answers
//!
//! Drafts land here before anything touches the workbook. The queue keeps
//! one proposal per target cell, renders as a markdown table for reading,
//! and turns into plain updates once the reviewer is done.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IntakeResult;
use crate::grid::column_letter;
use crate::types::{AnswerUpdate, Confidence};

/// Provenance marker for answers a reviewer typed in themselves
pub const USER_FILLED: &str = "User_filled";

/// One drafted answer awaiting review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Proposal {
    pub sheet_name: String,
    pub row_index: u32,
    #[serde(default)]
    pub column_index: u32,
    #[serde(rename = "Question")]
    pub question_text: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub provenance: String,
}

impl Proposal {
    /// Target-cell identity; one proposal per key survives in the queue
    pub fn key(&self) -> (&str, u32, u32) {
        (self.sheet_name.as_str(), self.row_index, self.column_index)
    }

    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }

    pub fn to_update(&self) -> AnswerUpdate {
        AnswerUpdate {
            sheet_name: self.sheet_name.clone(),
            row_index: self.row_index,
            column_index: self.column_index,
            question_text: Some(self.question_text.clone()),
            answer: self.answer.clone(),
            confidence: self.confidence,
            provenance: self.provenance.clone(),
        }
    }

    /// Compact cell reference for display ("C2", or "row 12" when the
    /// column is layout-resolved at persist time)
    fn cell_ref(&self) -> String {
        if self.column_index == 0 {
            format!("row {}", self.row_index)
        } else {
            format!("{}{}", column_letter(self.column_index), self.row_index)
        }
    }
}

/// Proposals keyed by target cell, held in (sheet, row, col) order so
/// display numbering is stable across upserts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewQueue {
    proposals: Vec<Proposal>,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the proposal for a target cell. A replacement
    /// keeps the cell's position and number.
    pub fn upsert(&mut self, proposal: Proposal) {
        let slot = self
            .proposals
            .binary_search_by(|p| p.key().cmp(&proposal.key()));
        match slot {
            Ok(i) => self.proposals[i] = proposal,
            Err(i) => self.proposals.insert(i, proposal),
        }
    }

    pub fn extend(&mut self, proposals: impl IntoIterator<Item = Proposal>) {
        for proposal in proposals {
            self.upsert(proposal);
        }
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Proposal by its 1-based display number
    pub fn get(&self, number: usize) -> Option<&Proposal> {
        number.checked_sub(1).and_then(|i| self.proposals.get(i))
    }

    pub fn unanswered(&self) -> Vec<&Proposal> {
        self.proposals.iter().filter(|p| !p.is_answered()).collect()
    }

    /// Overwrite a proposal's answer with reviewer-typed text. Reviewer
    /// answers are High confidence by definition and marked as such.
    pub fn set_answer(&mut self, number: usize, answer: &str) -> Option<&Proposal> {
        let proposal = number
            .checked_sub(1)
            .and_then(|i| self.proposals.get_mut(i))?;
        proposal.answer = answer.to_string();
        proposal.confidence = Confidence::High;
        proposal.provenance = USER_FILLED.to_string();
        Some(proposal)
    }

    pub fn to_updates(&self) -> Vec<AnswerUpdate> {
        self.proposals.iter().map(Proposal::to_update).collect()
    }

    /// Markdown table of the whole queue, one row per proposal. `#` is the
    /// queue number that `get` and `set_answer` take; `Q#` restarts at 1
    /// for each sheet and is the question's number within that sheet.
    pub fn render_markdown(&self) -> String {
        let mut out = String::from("| # | Sheet | Q# | Cell | Question | Answer | Confidence |\n");
        out.push_str("|---|-------|----|------|----------|--------|------------|\n");
        let mut current_sheet: Option<&str> = None;
        let mut sheet_number = 0;
        for (i, p) in self.proposals.iter().enumerate() {
            if current_sheet != Some(p.sheet_name.as_str()) {
                current_sheet = Some(p.sheet_name.as_str());
                sheet_number = 0;
            }
            sheet_number += 1;
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                markdown_safe(&p.sheet_name),
                sheet_number,
                p.cell_ref(),
                markdown_safe(&p.question_text),
                markdown_safe(&p.answer),
                p.confidence,
            ));
        }
        out
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> IntakeResult<()> {
        let json = serde_json::to_string_pretty(&self.proposals)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> IntakeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let proposals: Vec<Proposal> = serde_json::from_str(&raw)?;
        let mut queue = Self::new();
        queue.extend(proposals);
        Ok(queue)
    }
}

fn markdown_safe(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|")
}
