//! PostgreSQL implementation of ProfileStore.
//!
//! Schema lives in `migrations/` and is embedded at compile time.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ErrorCode, ProfileId, Timestamp};
use crate::domain::journal::{
    CameraLog, ConsentFlags, ConversationTurn, MoodEntry, MoodSource, Profile, TurnRole,
};
use crate::domain::vision::{Emotion, SignalMetrics};
use crate::ports::ProfileStore;

/// PostgreSQL implementation of ProfileStore.
#[derive(Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Creates a new PostgresProfileStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, nickname, focus_areas, consent_camera, consent_journaling,
                   mood_baseline, mbti, enneagram, archetype, zodiac, notes,
                   conversation_summary, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch profile", e))?;

        row.map(row_to_profile).transpose()
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, nickname, focus_areas, consent_camera, consent_journaling,
                mood_baseline, mbti, enneagram, archetype, zodiac, notes,
                conversation_summary, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                nickname = EXCLUDED.nickname,
                focus_areas = EXCLUDED.focus_areas,
                consent_camera = EXCLUDED.consent_camera,
                consent_journaling = EXCLUDED.consent_journaling,
                mood_baseline = EXCLUDED.mood_baseline,
                mbti = EXCLUDED.mbti,
                enneagram = EXCLUDED.enneagram,
                archetype = EXCLUDED.archetype,
                zodiac = EXCLUDED.zodiac,
                notes = EXCLUDED.notes,
                conversation_summary = EXCLUDED.conversation_summary
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.nickname)
        .bind(&profile.focus_areas)
        .bind(profile.consent.camera)
        .bind(profile.consent.journaling)
        .bind(&profile.mood_baseline)
        .bind(profile.mbti.as_deref())
        .bind(profile.enneagram.map(i16::from))
        .bind(profile.archetype.as_deref())
        .bind(profile.zodiac.as_deref())
        .bind(profile.notes.as_deref())
        .bind(profile.conversation_summary.as_deref())
        .bind(profile.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("save profile", e))?;

        Ok(())
    }

    async fn get_latest_mood(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<MoodEntry>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT profile_id, mood, note, source, created_at
            FROM mood_entries
            WHERE profile_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(profile_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch latest mood", e))?;

        row.map(row_to_mood_entry).transpose()
    }

    async fn get_latest_camera_log(
        &self,
        profile_id: ProfileId,
    ) -> Result<Option<CameraLog>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT profile_id, emotion, confidence, valence, energy, tension,
                   focus, tilt, cues, captured_at
            FROM camera_logs
            WHERE profile_id = $1
            ORDER BY captured_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(profile_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch latest camera log", e))?;

        row.map(row_to_camera_log).transpose()
    }

    async fn recent_conversation_turns(
        &self,
        profile_id: ProfileId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT profile_id, role, content, created_at
            FROM conversation_turns
            WHERE profile_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(profile_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch conversation turns", e))?;

        // Newest first from the query; callers want oldest first.
        let mut turns = rows
            .into_iter()
            .map(row_to_turn)
            .collect::<Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn append_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_turns (profile_id, role, content, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(turn.profile_id.as_uuid())
        .bind(turn.role.as_str())
        .bind(&turn.content)
        .bind(turn.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("append conversation turn", e))?;

        Ok(())
    }

    async fn update_conversation_summary(
        &self,
        profile_id: ProfileId,
        summary: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE profiles SET conversation_summary = $2 WHERE id = $1")
            .bind(profile_id.as_uuid())
            .bind(summary)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update conversation summary", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ProfileNotFound,
                format!("Profile not found: {}", profile_id),
            ));
        }

        Ok(())
    }

    async fn insert_mood_entry(&self, entry: &MoodEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO mood_entries (profile_id, mood, note, source, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.profile_id().as_uuid())
        .bind(entry.mood())
        .bind(entry.note())
        .bind(entry.source().as_str())
        .bind(entry.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert mood entry", e))?;

        Ok(())
    }

    async fn insert_camera_log(&self, log: &CameraLog) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO camera_logs (
                profile_id, emotion, confidence, valence, energy, tension,
                focus, tilt, cues, captured_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(log.profile_id.as_uuid())
        .bind(log.emotion.as_str())
        .bind(log.confidence)
        .bind(log.metrics.valence())
        .bind(log.metrics.energy())
        .bind(log.metrics.tension())
        .bind(log.metrics.focus())
        .bind(log.metrics.tilt())
        .bind(log.metrics.cues())
        .bind(log.captured_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert camera log", e))?;

        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn db_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::database(format!("Failed to {}: {}", action, err))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", name, e)))
}

fn timestamp_column(row: &PgRow, name: &str) -> Result<Timestamp, DomainError> {
    let value: chrono::DateTime<chrono::Utc> = column(row, name)?;
    Ok(Timestamp::from_datetime(value))
}

fn profile_id_column(row: &PgRow) -> Result<ProfileId, DomainError> {
    let id: uuid::Uuid = column(row, "profile_id")?;
    Ok(ProfileId::from_uuid(id))
}

fn row_to_profile(row: PgRow) -> Result<Profile, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let enneagram: Option<i16> = column(&row, "enneagram")?;
    let enneagram = enneagram
        .map(|value| {
            u8::try_from(value)
                .map_err(|_| DomainError::database(format!("Invalid enneagram: {}", value)))
        })
        .transpose()?;

    Ok(Profile {
        id: ProfileId::from_uuid(id),
        nickname: column(&row, "nickname")?,
        focus_areas: column(&row, "focus_areas")?,
        consent: ConsentFlags {
            camera: column(&row, "consent_camera")?,
            journaling: column(&row, "consent_journaling")?,
        },
        mood_baseline: column(&row, "mood_baseline")?,
        mbti: column(&row, "mbti")?,
        enneagram,
        archetype: column(&row, "archetype")?,
        zodiac: column(&row, "zodiac")?,
        notes: column(&row, "notes")?,
        conversation_summary: column(&row, "conversation_summary")?,
        created_at: timestamp_column(&row, "created_at")?,
    })
}

fn row_to_mood_entry(row: PgRow) -> Result<MoodEntry, DomainError> {
    let source: String = column(&row, "source")?;
    let source: MoodSource = source
        .parse()
        .map_err(|_| DomainError::database(format!("Invalid mood source: {}", source)))?;

    Ok(MoodEntry::reconstitute(
        profile_id_column(&row)?,
        column(&row, "mood")?,
        column(&row, "note")?,
        source,
        timestamp_column(&row, "created_at")?,
    ))
}

fn row_to_camera_log(row: PgRow) -> Result<CameraLog, DomainError> {
    let emotion: String = column(&row, "emotion")?;
    let emotion: Emotion = emotion
        .parse()
        .map_err(|_| DomainError::database(format!("Invalid emotion: {}", emotion)))?;
    let cues: Vec<String> = column(&row, "cues")?;

    // Stored rows went through the same clamping on the way in.
    let metrics = SignalMetrics::new(
        column(&row, "valence")?,
        column(&row, "energy")?,
        column(&row, "tension")?,
        column(&row, "focus")?,
    )
    .with_tilt(column(&row, "tilt")?)
    .with_cues(cues);

    Ok(CameraLog {
        profile_id: profile_id_column(&row)?,
        emotion,
        confidence: column(&row, "confidence")?,
        metrics,
        captured_at: timestamp_column(&row, "captured_at")?,
    })
}

fn row_to_turn(row: PgRow) -> Result<ConversationTurn, DomainError> {
    let role: String = column(&row, "role")?;
    let role = TurnRole::parse(&role)
        .ok_or_else(|| DomainError::database(format!("Invalid turn role: {}", role)))?;

    Ok(ConversationTurn {
        profile_id: profile_id_column(&row)?,
        role,
        content: column(&row, "content")?,
        created_at: timestamp_column(&row, "created_at")?,
    })
}
