//! Interactive terminal study session: explanation, quiz, then Q&A.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use diagramlens_config::DiagramLensConfig;
use diagramlens_core::Explanation;
use diagramlens_session::{ChatTranscript, QuizScore, QuizSession};
use diagramlens_understanding::DiagramTutor;
use media::ImagePayload;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::app;
use crate::terminal_output::{
    note_info, note_warn, option_label, paint, render_blocks, stream_write, supports_color, BOLD,
    DIM, GREEN, RED,
};

const QUIT: &str = "/quit";

pub async fn run(config: &DiagramLensConfig, image_path: &Path, questions: Option<u32>) -> Result<()> {
    let tutor = app::build_tutor(config)?;
    let image = app::load_image(image_path, config.max_upload_bytes()).await?;
    let color = supports_color();
    let mut out = std::io::stdout();

    note_info(&format!(
        "Reading {} with {} ...",
        image.filename,
        tutor.provider_name()
    ));
    let explanation = tutor.explain(&image).await?;
    let blocks = markdown::parse(&explanation.to_markdown());
    writeln!(out, "\n{}\n", render_blocks(&blocks, color))?;

    let mut input = BufReader::new(tokio::io::stdin());
    let count = questions.unwrap_or_else(|| config.question_count());
    match tutor.generate_quiz(&image, &explanation, count).await {
        Ok(questions) => {
            let mut quiz = QuizSession::new(questions);
            run_quiz(&mut quiz, &mut input, &mut out, color).await?;
        }
        Err(e) => note_warn(&format!("Quiz unavailable: {e}")),
    }

    run_chat(&tutor, &image, &explanation, &mut input, &mut out, color).await?;
    Ok(())
}

/// Accept `B`, `b` or `2` for the second of `options` choices.
pub fn parse_answer(input: &str, options: usize) -> Option<usize> {
    let input = input.trim();
    let index = if let Ok(n) = input.parse::<usize>() {
        n.checked_sub(1)?
    } else {
        let mut chars = input.chars();
        let c = chars.next()?.to_ascii_uppercase();
        if chars.next().is_some() || !c.is_ascii_uppercase() {
            return None;
        }
        (c as u8 - b'A') as usize
    };
    (index < options).then_some(index)
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Walk the quiz one question at a time. End of input stops early.
pub async fn run_quiz<R, W>(
    quiz: &mut QuizSession,
    input: &mut R,
    out: &mut W,
    color: bool,
) -> Result<QuizScore>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{}", paint("Quiz", BOLD, color))?;
    'questions: while let Some(question) = quiz.current_question().cloned() {
        let (position, total) = quiz.progress().unwrap_or((0, 0));
        writeln!(out, "\nQuestion {position} of {total}: {}", question.question)?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(out, "  {}) {option}", option_label(i))?;
        }

        let feedback = loop {
            stream_write(out, "Your answer: ")?;
            let Some(line) = read_line(input).await? else {
                writeln!(out)?;
                break 'questions;
            };
            match parse_answer(&line, question.options.len()) {
                Some(choice) => break quiz.select(choice)?,
                None => writeln!(
                    out,
                    "Pick a letter from A to {}.",
                    option_label(question.options.len().saturating_sub(1))
                )?,
            }
        };

        if feedback.correct {
            writeln!(out, "{}", paint("Correct.", GREEN, color))?;
        } else {
            writeln!(
                out,
                "{} The answer is {}.",
                paint("Not quite.", RED, color),
                option_label(feedback.correct_index)
            )?;
        }
        if !feedback.explanation.is_empty() {
            writeln!(out, "{}", paint(&feedback.explanation, DIM, color))?;
        }
        quiz.advance()?;
    }

    let score = quiz.score();
    if quiz.is_finished() {
        writeln!(
            out,
            "\nYou scored {} out of {} ({}%).",
            score.correct,
            score.total,
            score.percent()
        )?;
    }
    Ok(score)
}

/// Answer questions until `/quit` or end of input. Returns the transcript.
pub async fn run_chat<R, W>(
    tutor: &DiagramTutor,
    image: &ImagePayload,
    explanation: &Explanation,
    input: &mut R,
    out: &mut W,
    color: bool,
) -> Result<ChatTranscript>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut transcript = ChatTranscript::new();
    writeln!(
        out,
        "\n{} (type {QUIT} to leave)",
        paint("Ask about this diagram", BOLD, color)
    )?;

    loop {
        stream_write(out, "> ")?;
        let Some(question) = read_line(input).await? else {
            writeln!(out)?;
            break;
        };
        if question == QUIT {
            break;
        }
        if question.is_empty() {
            continue;
        }

        let history = transcript.history().to_vec();
        transcript.push_user(question.clone());
        match tutor
            .answer(image, Some(explanation), &history, &question)
            .await
        {
            Ok(answer) => {
                writeln!(out, "{}\n", render_blocks(&markdown::parse(&answer), color))?;
                transcript.push_model(answer);
            }
            Err(e) => {
                transcript.pop_pending_user();
                writeln!(out, "{}", paint(&format!("Could not answer: {e}"), RED, color))?;
            }
        }
    }
    Ok(transcript)
}
