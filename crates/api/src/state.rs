use mongodb::Database;
use std::sync::Arc;
use traino_config::Settings;
use traino_services::{
    DispatchEngine, Notifier, Sweeper,
    dao::{notification::NotificationDao, user::UserDao},
    notify::{
        EmailSender, NotificationStore, RecipientSource, SendError, SmsSender, SmtpMailer,
        TwilioSender,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub users: Arc<UserDao>,
    pub notifications: Arc<NotificationDao>,
    pub notifier: Arc<Notifier>,
    pub sweeper: Arc<Sweeper>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Result<Self, SendError> {
        let users = Arc::new(UserDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));

        let store: Arc<dyn NotificationStore> = notifications.clone();
        let recipients: Arc<dyn RecipientSource> = users.clone();
        let mailer: Arc<dyn EmailSender> = Arc::new(SmtpMailer::new(&settings.smtp)?);
        let twilio: Arc<dyn SmsSender> = Arc::new(TwilioSender::new(&settings.sms));

        let engine = Arc::new(DispatchEngine::new(
            store.clone(),
            recipients.clone(),
            mailer,
            twilio.clone(),
            &settings.notifier,
        ));
        let notifier = Arc::new(Notifier::new(
            store.clone(),
            recipients,
            twilio,
            engine.clone(),
        ));
        let sweeper = Arc::new(Sweeper::new(store, engine));

        Ok(Self {
            db,
            settings,
            users,
            notifications,
            notifier,
            sweeper,
        })
    }
}
