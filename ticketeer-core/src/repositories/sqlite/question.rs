// src/repositories/sqlite/question.rs

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use ticketeer_common::Error;
use ticketeer_common::models::{NewQuestion, Question, QuestionStyle};
use ticketeer_common::traits::repository_traits as traits;

pub struct QuestionRepository {
    pub pool: sqlx::Pool<sqlx::Sqlite>,
}

impl QuestionRepository {
    pub fn new(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        Self { pool }
    }
}

fn question_from_row(r: &SqliteRow) -> Result<Question, Error> {
    Ok(Question {
        question_id: r.try_get("question_id")?,
        ticket_type_id: r.try_get("ticket_type_id")?,
        label: r.try_get("question_label")?,
        placeholder: r.try_get("question_placeholder")?,
        style: QuestionStyle::parse(r.try_get::<String, _>("question_style")?.as_str()),
        required: r.try_get("required")?,
        min_length: r.try_get("min_length")?,
        max_length: r.try_get("max_length")?,
        order_index: r.try_get("order_index")?,
    })
}

const QUESTION_COLUMNS: &str = r#"
    question_id, ticket_type_id, question_label, question_placeholder,
    question_style, required, min_length, max_length, order_index
"#;

#[async_trait::async_trait]
impl traits::QuestionRepository for QuestionRepository {
    async fn create(&self, question: &NewQuestion) -> Result<i64, Error> {
        let style = question.style.unwrap_or_default();
        let required = question.required.unwrap_or(true);

        // New questions go to the end of the form.
        let next_index = self.count_for_type(question.ticket_type_id).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO ticket_questions (
                ticket_type_id, question_label, question_placeholder,
                question_style, required, min_length, max_length, order_index
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(question.ticket_type_id)
        .bind(&question.label)
        .bind(&question.placeholder)
        .bind(style.as_str())
        .bind(required)
        .bind(question.min_length)
        .bind(question.max_length)
        .bind(next_index)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, question_id: i64) -> Result<Option<Question>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM ticket_questions WHERE question_id = ?"
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(question_from_row).transpose()
    }

    async fn list_for_type(&self, ticket_type_id: i64) -> Result<Vec<Question>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM ticket_questions
             WHERE ticket_type_id = ?
             ORDER BY order_index, question_id"
        ))
        .bind(ticket_type_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(question_from_row).collect()
    }

    async fn count_for_type(&self, ticket_type_id: i64) -> Result<i64, Error> {
        let row =
            sqlx::query("SELECT COUNT(*) AS cnt FROM ticket_questions WHERE ticket_type_id = ?")
                .bind(ticket_type_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn update(&self, question: &Question) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE ticket_questions
            SET question_label = ?,
                question_placeholder = ?,
                question_style = ?,
                required = ?,
                min_length = ?,
                max_length = ?,
                order_index = ?
            WHERE question_id = ?
            "#,
        )
        .bind(&question.label)
        .bind(&question.placeholder)
        .bind(question.style.as_str())
        .bind(question.required)
        .bind(question.min_length)
        .bind(question.max_length)
        .bind(question.order_index)
        .bind(question.question_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, question_id: i64) -> Result<(), Error> {
        sqlx::query("DELETE FROM ticket_questions WHERE question_id = ?")
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
