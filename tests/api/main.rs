mod health;
mod rate;
mod send_emails;
