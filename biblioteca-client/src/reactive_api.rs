//! Resource operations run through the [`ReactiveCaller`], with entity
//! events published on success.

use crate::api::{Authors, Books, Loans, Users};
use crate::models::{Author, AuthorForm, Book, BookForm, Loan, LoanForm, User, UserForm};
use crate::reactive::{CallPolicy, ReactiveCaller, ResolvedPolicy};
use crate::{HttpClient, IdempotencyKey, Result};
use biblioteca_events::{EntityAction, EntityKind, EventBus, LoanEventType, LoanPayload};
use serde_json::json;

/// Wrapped REST API.
///
/// Creates and loan returns generate one [`IdempotencyKey`] per call and
/// send it with every attempt.
#[derive(Clone)]
pub struct ReactiveApi {
    caller: ReactiveCaller,
    users: Users,
    authors: Authors,
    books: Books,
    loans: Loans,
}

impl ReactiveApi {
    pub fn new(client: HttpClient, bus: EventBus, policy: CallPolicy) -> Self {
        Self {
            caller: ReactiveCaller::new(bus, policy),
            users: Users::new(client.clone()),
            authors: Authors::new(client.clone()),
            books: Books::new(client.clone()),
            loans: Loans::new(client),
        }
    }

    pub fn caller(&self) -> &ReactiveCaller {
        &self.caller
    }

    pub fn policy(&self) -> CallPolicy {
        self.caller.policy()
    }

    pub fn effective_policy(&self) -> ResolvedPolicy {
        self.caller.effective_policy()
    }

    pub fn update_policy(&self, policy: CallPolicy) {
        self.caller.update_policy(policy);
    }

    fn bus(&self) -> &EventBus {
        self.caller.bus()
    }

    // ========================================================================
    // Loans
    // ========================================================================

    pub async fn get_loans(&self) -> Result<Vec<Loan>> {
        let loans = &self.loans;
        self.caller.call("GET_LOANS", move || loans.list()).await
    }

    pub async fn get_loan(&self, id: i64) -> Result<Loan> {
        let loans = &self.loans;
        self.caller.call("GET_LOAN", move || loans.get(id)).await
    }

    pub async fn create_loan(&self, form: &LoanForm) -> Result<Loan> {
        let loans = &self.loans;
        let key = &IdempotencyKey::new();
        let loan = self
            .caller
            .call("CREATE_LOAN", move || loans.create(form, Some(key)))
            .await?;

        self.bus().publish_loan(
            LoanEventType::Created,
            &LoanPayload {
                loan_id: Some(loan.id),
                user_id: Some(form.user_id),
                book_id: Some(form.book_id),
                metrics: None,
            },
        );
        Ok(loan)
    }

    pub async fn return_loan(&self, id: i64) -> Result<Loan> {
        let loans = &self.loans;
        let key = &IdempotencyKey::new();
        let loan = self
            .caller
            .call("RETURN_LOAN", move || loans.return_loan(id, Some(key)))
            .await?;

        self.bus().publish_loan(
            LoanEventType::Returned,
            &LoanPayload {
                loan_id: Some(loan.id),
                ..Default::default()
            },
        );
        Ok(loan)
    }

    // ========================================================================
    // Authors
    // ========================================================================

    pub async fn get_authors(&self) -> Result<Vec<Author>> {
        let authors = &self.authors;
        self.caller.call("GET_AUTHORS", move || authors.list()).await
    }

    pub async fn get_author(&self, id: i64) -> Result<Author> {
        let authors = &self.authors;
        self.caller.call("GET_AUTHOR", move || authors.get(id)).await
    }

    pub async fn create_author(&self, form: &AuthorForm) -> Result<Author> {
        let authors = &self.authors;
        let key = &IdempotencyKey::new();
        let author = self
            .caller
            .call("CREATE_AUTHOR", move || authors.create(form, Some(key)))
            .await?;

        self.publish_author(EntityAction::Created, &author);
        Ok(author)
    }

    pub async fn update_author(&self, id: i64, form: &AuthorForm) -> Result<Author> {
        let authors = &self.authors;
        let author = self
            .caller
            .call("UPDATE_AUTHOR", move || authors.update(id, form))
            .await?;

        self.publish_author(EntityAction::Updated, &author);
        Ok(author)
    }

    pub async fn delete_author(&self, id: i64) -> Result<()> {
        let authors = &self.authors;
        self.caller
            .call("DELETE_AUTHOR", move || authors.delete(id))
            .await?;

        self.bus()
            .publish_entity(EntityKind::Author, EntityAction::Deleted, json!({ "authorId": id }));
        Ok(())
    }

    fn publish_author(&self, action: EntityAction, author: &Author) {
        self.bus().publish_entity(
            EntityKind::Author,
            action,
            json!({
                "authorId": author.id,
                "nombre": author.name,
                "nacionalidad": author.nationality,
            }),
        );
    }

    // ========================================================================
    // Books
    // ========================================================================

    pub async fn get_books(&self) -> Result<Vec<Book>> {
        let books = &self.books;
        self.caller.call("GET_BOOKS", move || books.list()).await
    }

    pub async fn get_book(&self, id: i64) -> Result<Book> {
        let books = &self.books;
        self.caller.call("GET_BOOK", move || books.get(id)).await
    }

    pub async fn create_book(&self, form: &BookForm) -> Result<Book> {
        let books = &self.books;
        let key = &IdempotencyKey::new();
        let book = self
            .caller
            .call("CREATE_BOOK", move || books.create(form, Some(key)))
            .await?;

        self.publish_book(EntityAction::Created, book.id);
        Ok(book)
    }

    pub async fn update_book(&self, id: i64, form: &BookForm) -> Result<Book> {
        let books = &self.books;
        let book = self
            .caller
            .call("UPDATE_BOOK", move || books.update(id, form))
            .await?;

        self.publish_book(EntityAction::Updated, book.id);
        Ok(book)
    }

    pub async fn delete_book(&self, id: i64) -> Result<()> {
        let books = &self.books;
        self.caller
            .call("DELETE_BOOK", move || books.delete(id))
            .await?;

        self.publish_book(EntityAction::Deleted, id);
        Ok(())
    }

    fn publish_book(&self, action: EntityAction, id: i64) {
        self.bus()
            .publish_entity(EntityKind::Book, action, json!({ "bookId": id }));
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_users(&self) -> Result<Vec<User>> {
        let users = &self.users;
        self.caller.call("GET_USERS", move || users.list()).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        let users = &self.users;
        self.caller.call("GET_USER", move || users.get(id)).await
    }

    pub async fn create_user(&self, form: &UserForm) -> Result<User> {
        let users = &self.users;
        let key = &IdempotencyKey::new();
        let user = self
            .caller
            .call("CREATE_USER", move || users.create(form, Some(key)))
            .await?;

        self.publish_user(EntityAction::Created, user.id);
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, form: &UserForm) -> Result<User> {
        let users = &self.users;
        let user = self
            .caller
            .call("UPDATE_USER", move || users.update(id, form))
            .await?;

        self.publish_user(EntityAction::Updated, user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let users = &self.users;
        self.caller
            .call("DELETE_USER", move || users.delete(id))
            .await?;

        self.publish_user(EntityAction::Deleted, id);
        Ok(())
    }

    fn publish_user(&self, action: EntityAction, id: i64) {
        self.bus()
            .publish_entity(EntityKind::User, action, json!({ "userId": id }));
    }
}
