use sea_orm_migration::prelude::{extension::postgres::{Type, TypeCreateStatement, TypeDropStatement}, *};

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Postgres enum type named `name`
pub(crate) fn enum_type(name: &str, values: &[&str]) -> TypeCreateStatement {
    Type::create()
        .as_enum(Alias::new(name))
        .values(values.iter().map(|value| Alias::new(*value)))
        .to_owned()
}

pub(crate) fn drop_enum_type(name: &str) -> TypeDropStatement {
    Type::drop()
        .if_exists()
        .name(Alias::new(name))
        .to_owned()
}

/// Money, two decimal places
pub(crate) fn money(column: impl IntoIden) -> ColumnDef {
    ColumnDef::new(column)
        .decimal_len(14, 2)
        .not_null()
        .default(0)
        .take()
}

/// Day counts, half days included
pub(crate) fn days(column: impl IntoIden) -> ColumnDef {
    ColumnDef::new(column)
        .decimal_len(6, 1)
        .not_null()
        .default(0)
        .take()
}

/// `from.column` references `to.id`, cascading deletes and updates
pub(crate) fn cascade_fk(from: impl IntoIden + 'static, column: impl IntoIden, to: impl IntoIden + 'static) -> ForeignKeyCreateStatement {
    ForeignKeyCreateStatement::new()
        .from_tbl(from)
        .from_col(column)
        .to_tbl(to)
        .to_col(DefaultColumn::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .take()
}

pub(crate) fn unique_index(name: &str, table: impl IntoIden + 'static, columns: impl IntoIterator<Item = DynIden>) -> IndexCreateStatement {
    let mut index = Index::create();
    index.name(name).table(table).unique().if_not_exists();

    for column in columns {
        index.col(column);
    }

    index.take()
}
