use crate::{
    models::{NewUser, User, UserSummary},
    schema::qc::users,
    types::Role,
    Error, Store,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

fn one_row(updated: usize) -> Result<(), Error> {
    match updated {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

pub(crate) async fn load_active_user_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> Result<Option<User>, Error> {
    users::table
        .filter(users::username.eq(username))
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(Into::into)
}

pub(crate) async fn list_users(conn: &mut AsyncPgConnection) -> Result<Vec<UserSummary>, Error> {
    users::table
        .order(users::id)
        .select(UserSummary::as_select())
        .load(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn insert_user(
    conn: &mut AsyncPgConnection,
    new_user: NewUser,
) -> Result<i32, Error> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(users::id)
        .get_result(conn)
        .await
        .map_err(Into::into)
}

pub(crate) async fn update_user(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    username: &str,
    role: Role,
) -> Result<(), Error> {
    one_row(
        diesel::update(users::table.find(user_id))
            .set((users::username.eq(username), users::role.eq(role.as_str())))
            .execute(conn)
            .await?,
    )
}

pub(crate) async fn toggle_user_active(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<(), Error> {
    one_row(
        diesel::update(users::table.find(user_id))
            .set(users::is_active.eq(diesel::dsl::not(users::is_active)))
            .execute(conn)
            .await?,
    )
}

pub(crate) async fn set_password_hash(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    password_hash: &str,
) -> Result<(), Error> {
    one_row(
        diesel::update(users::table.find(user_id))
            .set(users::password_hash.eq(password_hash))
            .execute(conn)
            .await?,
    )
}

pub(crate) async fn any_admin_exists(conn: &mut AsyncPgConnection) -> Result<bool, Error> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::role.eq(Role::Admin.as_str())),
    ))
    .get_result(conn)
    .await
    .map_err(Into::into)
}

impl Store {
    #[tracing::instrument(skip(self))]
    pub async fn load_active_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let mut conn = self.connection().await?;
        load_active_user_by_username(&mut conn, username).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, Error> {
        let mut conn = self.connection().await?;
        list_users(&mut conn).await
    }

    #[tracing::instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<i32, Error> {
        let mut conn = self.connection().await?;
        insert_user(&mut conn, new_user).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_user(&self, user_id: i32, username: &str, role: Role) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        update_user(&mut conn, user_id, username, role).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_user_active(&self, user_id: i32) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        toggle_user_active(&mut conn, user_id).await
    }

    #[tracing::instrument(skip(self, password_hash))]
    pub async fn set_password_hash(&self, user_id: i32, password_hash: &str) -> Result<(), Error> {
        let mut conn = self.connection().await?;
        set_password_hash(&mut conn, user_id, password_hash).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn any_admin_exists(&self) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        any_admin_exists(&mut conn).await
    }
}
